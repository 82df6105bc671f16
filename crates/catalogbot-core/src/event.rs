//! Request outcome events.
//!
//! One `RequestEvent` is produced per completed enrichment call. The typed
//! form is what the aggregator consumes; `RawEvent` is the untyped inbound
//! form (HTTP body, test vectors) and is only turned into a `RequestEvent`
//! after its portal/source names and latency check out.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogBotError, RejectReason, Result};

/// Upper bound on a single call's latency (one day).
pub const MAX_LATENCY_SECONDS: f64 = 86_400.0;

/// Product domain served by the enrichment API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    Catalog,
    Parts,
    HomeProducts,
}

impl Portal {
    /// All portals in their fixed reporting order.
    pub const ALL: [Portal; 3] = [Portal::Catalog, Portal::Parts, Portal::HomeProducts];

    pub fn as_str(self) -> &'static str {
        match self {
            Portal::Catalog => "catalog",
            Portal::Parts => "parts",
            Portal::HomeProducts => "home_products",
        }
    }

    /// Enrichment endpoint fronted by this portal.
    pub fn endpoint(self) -> &'static str {
        match self {
            Portal::Catalog => "/enrich",
            Portal::Parts => "/enrich-part",
            Portal::HomeProducts => "/enrich-home-product",
        }
    }

    /// Dense index into per-portal arrays.
    pub fn index(self) -> usize {
        match self {
            Portal::Catalog => 0,
            Portal::Parts => 1,
            Portal::HomeProducts => 2,
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Portal {
    type Err = CatalogBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "catalog" => Ok(Portal::Catalog),
            "parts" => Ok(Portal::Parts),
            "home_products" => Ok(Portal::HomeProducts),
            other => Err(CatalogBotError::invalid(
                RejectReason::InvalidPortal,
                format!("unknown portal: {other}"),
            )),
        }
    }
}

/// Where a request originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// The bundled portal UI.
    Ui,
    /// A direct API caller.
    Api,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Ui => "ui",
            Source::Api => "api",
        }
    }

    /// Classify a request by its `Referer` header.
    ///
    /// A referer containing any of `ui_origins` is a UI call; anything else,
    /// including a missing referer, is an API call.
    pub fn from_referer<S: AsRef<str>>(referer: Option<&str>, ui_origins: &[S]) -> Self {
        match referer {
            Some(r) if ui_origins.iter().any(|o| r.contains(o.as_ref())) => Source::Ui,
            _ => Source::Api,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = CatalogBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ui" => Ok(Source::Ui),
            "api" => Ok(Source::Api),
            other => Err(CatalogBotError::invalid(
                RejectReason::InvalidSource,
                format!("unknown source: {other}"),
            )),
        }
    }
}

/// Outcome of one enrichment call.
///
/// Never mutated after construction; the aggregator stores clones.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEvent {
    pub portal: Portal,
    pub source: Source,
    pub success: bool,
    pub latency_seconds: f64,
    pub timestamp: DateTime<Utc>,
    pub brand: Option<String>,
    pub model_number: Option<String>,
}

impl RequestEvent {
    /// Event stamped with the current time and no product identifiers.
    pub fn new(portal: Portal, source: Source, success: bool, latency_seconds: f64) -> Self {
        Self {
            portal,
            source,
            success,
            latency_seconds,
            timestamp: Utc::now(),
            brand: None,
            model_number: None,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_model_number(mut self, model_number: impl Into<String>) -> Self {
        self.model_number = Some(model_number.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Check the invariants the aggregator relies on.
    pub fn validate(&self) -> Result<()> {
        if !self.latency_seconds.is_finite() {
            return Err(CatalogBotError::invalid(
                RejectReason::InvalidLatency,
                format!("latency must be finite, got {}", self.latency_seconds),
            ));
        }
        if self.latency_seconds < 0.0 {
            return Err(CatalogBotError::invalid(
                RejectReason::InvalidLatency,
                format!("latency must be non-negative, got {}", self.latency_seconds),
            ));
        }
        if self.latency_seconds > MAX_LATENCY_SECONDS {
            return Err(CatalogBotError::invalid(
                RejectReason::InvalidLatency,
                format!(
                    "latency must be at most {MAX_LATENCY_SECONDS}s, got {}",
                    self.latency_seconds
                ),
            ));
        }
        Ok(())
    }
}

/// Untyped inbound event.
///
/// `source` is optional because HTTP callers may leave it to referer
/// detection; converting without one defaults to `api`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEvent {
    pub portal: String,
    #[serde(default)]
    pub source: Option<String>,
    pub success: bool,
    pub latency_seconds: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
}

impl RawEvent {
    /// Parse names, apply `fallback_source` when none was given, and validate.
    pub fn into_event(self, fallback_source: Source) -> Result<RequestEvent> {
        let portal: Portal = self.portal.parse()?;
        let source = match self.source.as_deref() {
            Some(s) => s.parse()?,
            None => fallback_source,
        };

        let event = RequestEvent {
            portal,
            source,
            success: self.success,
            latency_seconds: self.latency_seconds,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            brand: self.brand,
            model_number: self.model_number,
        };
        event.validate()?;
        Ok(event)
    }
}

impl TryFrom<RawEvent> for RequestEvent {
    type Error = CatalogBotError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        raw.into_event(Source::Api)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn portal_names_round_trip_through_from_str() {
        for p in Portal::ALL {
            assert_eq!(p.as_str().parse::<Portal>().unwrap(), p);
        }
        assert_eq!(Portal::HomeProducts.endpoint(), "/enrich-home-product");
    }

    #[test]
    fn unknown_portal_is_invalid_event() {
        let err = "garden".parse::<Portal>().unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::InvalidPortal));
    }

    #[test]
    fn referer_detection() {
        let origins = ["vercel.app", "localhost"];
        assert_eq!(
            Source::from_referer(Some("https://catalog-bot.vercel.app/parts"), &origins),
            Source::Ui
        );
        assert_eq!(Source::from_referer(Some("http://localhost:5173/"), &origins), Source::Ui);
        assert_eq!(Source::from_referer(Some("https://example.com"), &origins), Source::Api);
        assert_eq!(Source::from_referer(None, &origins), Source::Api);
    }

    #[test]
    fn negative_and_nan_latency_rejected() {
        let neg = RequestEvent::new(Portal::Parts, Source::Ui, true, -0.5);
        assert_eq!(neg.validate().unwrap_err().reject_reason(), Some(RejectReason::InvalidLatency));

        let nan = RequestEvent::new(Portal::Parts, Source::Ui, true, f64::NAN);
        assert!(nan.validate().is_err());

        let zero = RequestEvent::new(Portal::Parts, Source::Ui, false, 0.0);
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn latency_above_one_day_rejected() {
        let max = RequestEvent::new(Portal::Catalog, Source::Api, true, MAX_LATENCY_SECONDS);
        assert!(max.validate().is_ok());

        for huge in [MAX_LATENCY_SECONDS + 1.0, 1e307, f64::MAX] {
            let ev = RequestEvent::new(Portal::Catalog, Source::Ui, true, huge);
            assert_eq!(
                ev.validate().unwrap_err().reject_reason(),
                Some(RejectReason::InvalidLatency),
                "latency={huge}"
            );
        }
    }
}
