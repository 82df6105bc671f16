//! Point-in-time metrics snapshot and its JSON wire shape.
//!
//! The dashboard expects a fixed layout: `totals`, then `portals` keyed by
//! portal name in catalog/parts/home_products order, then `recent_logs`.
//! Field order below is the serialized order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use catalogbot_core::{Portal, RequestEvent};

use super::aggregator::PortalCounters;

/// Consistent copy of the aggregator state.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub portals: [PortalCounters; 3],
    pub totals: PortalCounters,
    /// Oldest first.
    pub recent_logs: Vec<RequestEvent>,
}

impl MetricsSnapshot {
    pub fn portal(&self, portal: Portal) -> &PortalCounters {
        &self.portals[portal.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.totals.total_requests == 0 && self.recent_logs.is_empty()
    }
}

fn wire_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn round2(v: f64) -> f64 {
    let scaled = v * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        v
    }
}

#[derive(Serialize)]
struct TotalsWire {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    ui_calls: u64,
    api_calls: u64,
}

#[derive(Serialize)]
struct PortalWire {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    ui_calls: u64,
    api_calls: u64,
    avg_response_time: f64,
    last_used: Option<String>,
}

impl From<&PortalCounters> for PortalWire {
    fn from(c: &PortalCounters) -> Self {
        Self {
            total_requests: c.total_requests,
            successful_requests: c.successful_requests,
            failed_requests: c.failed_requests,
            ui_calls: c.ui_calls,
            api_calls: c.api_calls,
            avg_response_time: c.avg_response_time(),
            last_used: c.last_used.as_ref().map(wire_timestamp),
        }
    }
}

#[derive(Serialize)]
struct PortalsWire {
    catalog: PortalWire,
    parts: PortalWire,
    home_products: PortalWire,
}

#[derive(Serialize)]
struct LogWire<'a> {
    timestamp: String,
    portal: &'static str,
    source: &'static str,
    brand: Option<&'a str>,
    model_number: Option<&'a str>,
    success: bool,
    response_time: f64,
}

impl<'a> From<&'a RequestEvent> for LogWire<'a> {
    fn from(ev: &'a RequestEvent) -> Self {
        Self {
            timestamp: wire_timestamp(&ev.timestamp),
            portal: ev.portal.as_str(),
            source: ev.source.as_str(),
            brand: ev.brand.as_deref(),
            model_number: ev.model_number.as_deref(),
            success: ev.success,
            response_time: round2(ev.latency_seconds),
        }
    }
}

#[derive(Serialize)]
struct SnapshotWire<'a> {
    totals: TotalsWire,
    portals: PortalsWire,
    recent_logs: Vec<LogWire<'a>>,
}

impl Serialize for MetricsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let t = &self.totals;
        SnapshotWire {
            totals: TotalsWire {
                total_requests: t.total_requests,
                successful_requests: t.successful_requests,
                failed_requests: t.failed_requests,
                ui_calls: t.ui_calls,
                api_calls: t.api_calls,
            },
            portals: PortalsWire {
                catalog: self.portal(Portal::Catalog).into(),
                parts: self.portal(Portal::Parts).into(),
                home_products: self.portal(Portal::HomeProducts).into(),
            },
            recent_logs: self.recent_logs.iter().map(LogWire::from).collect(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalogbot_core::Source;
    use serde_json::json;

    use crate::obs::aggregator::MetricsAggregator;

    use super::*;

    #[test]
    fn empty_snapshot_wire_shape() {
        let agg = MetricsAggregator::default();
        let v = serde_json::to_value(agg.snapshot()).unwrap();
        let zero_portal = json!({
            "total_requests": 0, "successful_requests": 0, "failed_requests": 0,
            "ui_calls": 0, "api_calls": 0, "avg_response_time": 0.0, "last_used": null
        });
        assert_eq!(
            v,
            json!({
                "totals": { "total_requests": 0, "successful_requests": 0, "failed_requests": 0,
                            "ui_calls": 0, "api_calls": 0 },
                "portals": {
                    "catalog": zero_portal.clone(),
                    "parts": zero_portal.clone(),
                    "home_products": zero_portal,
                },
                "recent_logs": []
            })
        );
    }

    #[test]
    fn log_entry_wire_shape() {
        let agg = MetricsAggregator::default();
        let ts = "2025-06-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        agg.record(
            RequestEvent::new(Portal::Parts, Source::Ui, true, 1.23456)
                .with_brand("Bosch")
                .at(ts),
        )
        .unwrap();

        let v = serde_json::to_value(agg.snapshot()).unwrap();
        assert_eq!(
            v["recent_logs"][0],
            json!({
                "timestamp": "2025-06-01T12:00:00.000000Z",
                "portal": "parts",
                "source": "ui",
                "brand": "Bosch",
                "model_number": null,
                "success": true,
                "response_time": 1.23
            })
        );
        assert_eq!(v["portals"]["parts"]["last_used"], "2025-06-01T12:00:00.000000Z");
        assert_eq!(v["portals"]["parts"]["avg_response_time"], 1.23456);
    }

    #[test]
    fn round2_keeps_large_values_finite() {
        assert_eq!(round2(1.005e3), 1005.0);
        assert_eq!(round2(1e307), 1e307);
        assert_eq!(round2(f64::MAX), f64::MAX);
    }

    #[test]
    fn top_level_key_order() {
        let agg = MetricsAggregator::default();
        let s = serde_json::to_string(&agg.snapshot()).unwrap();
        let totals = s.find("\"totals\"").unwrap();
        let portals = s.find("\"portals\"").unwrap();
        let logs = s.find("\"recent_logs\"").unwrap();
        assert!(totals < portals && portals < logs);

        let catalog = s.find("\"catalog\"").unwrap();
        let parts = s.find("\"parts\"").unwrap();
        let home = s.find("\"home_products\"").unwrap();
        assert!(catalog < parts && parts < home);
    }
}
