//! Shared application state for the Catalog-BOT metrics gateway.
//!
//! The aggregator is built here once, from config, and handed out as an
//! `Arc` to request handlers, the `/metrics` renderer and the poller.

use std::sync::Arc;

use catalogbot_core::error::{CatalogBotError, Result};
use catalogbot_core::{RawEvent, RequestEvent, Source};

use crate::config::GatewayConfig;
use crate::obs::{GatewayMetrics, MetricsAggregator};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    aggregator: Arc<MetricsAggregator>,
    metrics: Arc<GatewayMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let aggregator = MetricsAggregator::new(cfg.metrics.recent_logs_capacity)?;

        if cfg.auth.api_keys.is_empty() {
            tracing::warn!("auth.api_keys is empty; metrics endpoints are unauthenticated");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            aggregator: Arc::new(aggregator),
            metrics: Arc::new(GatewayMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn aggregator(&self) -> Arc<MetricsAggregator> {
        Arc::clone(&self.aggregator)
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Check an `X-API-KEY` value against the configured keys.
    pub fn authorize(&self, route: &'static str, key: Option<&str>) -> Result<()> {
        let keys = &self.cfg().auth.api_keys;
        if keys.is_empty() {
            return Ok(());
        }
        match key {
            Some(k) if keys.iter().any(|known| known == k) => Ok(()),
            _ => {
                self.metrics.auth_failures.inc(&[("route", route)]);
                tracing::warn!(route, key_present = key.is_some(), "api key rejected");
                Err(CatalogBotError::AuthFailed)
            }
        }
    }

    /// Record one outcome event.
    ///
    /// Rejections are counted and logged here and returned to the caller,
    /// who drops the event.
    pub fn record_event(&self, event: RequestEvent) -> Result<()> {
        let portal = event.portal;
        let latency = event.latency_seconds;
        match self.aggregator.record(event) {
            Ok(()) => {
                self.metrics
                    .event_latency
                    .observe_secs(&[("portal", portal.as_str()), ("endpoint", portal.endpoint())], latency);
                Ok(())
            }
            Err(e) => {
                self.note_rejected(Some(portal.as_str()), &e);
                Err(e)
            }
        }
    }

    /// Convert and record an inbound event. A missing `source` is detected
    /// from the request's `Referer`.
    pub fn record_raw(&self, raw: RawEvent, referer: Option<&str>) -> Result<()> {
        let fallback = Source::from_referer(referer, &self.cfg().auth.ui_origins);
        let portal_name = raw.portal.clone();
        match raw.into_event(fallback) {
            Ok(event) => self.record_event(event),
            Err(e) => {
                self.note_rejected(Some(portal_name.as_str()), &e);
                Err(e)
            }
        }
    }

    /// Clear all aggregated counters and logs.
    pub fn reset(&self) {
        self.aggregator.reset();
        tracing::info!("portal metrics reset");
    }

    fn note_rejected(&self, portal: Option<&str>, err: &CatalogBotError) {
        if let Some(reason) = err.reject_reason() {
            self.metrics
                .events_rejected
                .inc(&[("reason", reason.as_str())]);
        }
        tracing::warn!(portal = portal.unwrap_or("-"), error = %err, "event rejected");
    }
}
