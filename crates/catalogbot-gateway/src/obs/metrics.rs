//! Operational metrics registry and Prometheus text rendering.
//!
//! Counters and histograms use dynamic labels backed by `DashMap`. Labels
//! are flattened into sorted key vectors to keep deterministic ordering.
//! Per-portal request figures are not duplicated here; `render` reads them
//! from an aggregator snapshot.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use catalogbot_core::Portal;

use super::snapshot::MetricsSnapshot;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for a label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

// Enrichment calls take seconds, so buckets are in milliseconds:
// 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s
const BUCKETS_MILLIS: [u64; 10] = [50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000, 60_000];

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MILLIS.len()],
}

impl Default for AtomicHistogram {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a latency in seconds, stored as whole milliseconds.
    pub fn observe_secs(&self, labels: &[(&str, &str)], secs: f64) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let millis = (secs.max(0.0) * 1000.0).round() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(millis, Ordering::Relaxed);

        // cumulative buckets
        for (i, &b) in BUCKETS_MILLIS.iter().enumerate() {
            if millis <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let labels = label_str(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (i, &le) in BUCKETS_MILLIS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, labels, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, count);
        }
    }
}

#[derive(Default)]
pub struct GatewayMetrics {
    pub events_rejected: CounterVec,
    pub auth_failures: CounterVec,
    pub event_latency: HistogramVec, // milliseconds
    draining: AtomicBool,
}

impl GatewayMetrics {
    /// Mark draining state.
    pub fn set_draining(&self) { self.draining.store(true, Ordering::Relaxed); }
    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool { self.draining.load(Ordering::Relaxed) }

    /// Render operational metrics followed by per-portal figures from `snap`.
    pub fn render(&self, snap: &MetricsSnapshot) -> String {
        let mut out = String::new();
        self.events_rejected.render("catalogbot_events_rejected_total", &mut out);
        self.auth_failures.render("catalogbot_auth_failures_total", &mut out);
        self.event_latency.render("catalogbot_event_latency_millis", &mut out);

        let _ = writeln!(out, "# TYPE catalogbot_portal_requests_total counter");
        for p in Portal::ALL {
            let c = snap.portal(p);
            let _ = writeln!(out, "catalogbot_portal_requests_total{{outcome=\"success\",portal=\"{}\"}} {}", p, c.successful_requests);
            let _ = writeln!(out, "catalogbot_portal_requests_total{{outcome=\"failure\",portal=\"{}\"}} {}", p, c.failed_requests);
        }

        let _ = writeln!(out, "# TYPE catalogbot_portal_calls_total counter");
        for p in Portal::ALL {
            let c = snap.portal(p);
            let _ = writeln!(out, "catalogbot_portal_calls_total{{portal=\"{}\",source=\"ui\"}} {}", p, c.ui_calls);
            let _ = writeln!(out, "catalogbot_portal_calls_total{{portal=\"{}\",source=\"api\"}} {}", p, c.api_calls);
        }

        let _ = writeln!(out, "# TYPE catalogbot_portal_avg_response_seconds gauge");
        for p in Portal::ALL {
            let _ = writeln!(out, "catalogbot_portal_avg_response_seconds{{portal=\"{}\"}} {}", p, snap.portal(p).avg_response_time());
        }

        let _ = writeln!(out, "# TYPE catalogbot_draining gauge\ncatalogbot_draining {}", if self.is_draining() { 1 } else { 0 });
        out
    }
}
