//! Per-portal request outcome aggregator.
//!
//! All state sits behind one mutex: `record` updates the portal counters and
//! the recent-logs ring in a single critical section, and `snapshot` copies
//! both under the same lock, so readers never see a half-applied event.
//! Nothing inside the lock allocates beyond the cloned event strings.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use catalogbot_core::error::{CatalogBotError, Result};
use catalogbot_core::{Portal, RequestEvent, Source};

use super::snapshot::MetricsSnapshot;

/// Default number of recent events kept for the dashboard log table.
pub const DEFAULT_RECENT_LOGS_CAPACITY: usize = 50;

/// Rolling counters for one portal (or the totals across portals).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalCounters {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub ui_calls: u64,
    pub api_calls: u64,
    pub cumulative_latency: f64,
    pub last_used: Option<DateTime<Utc>>,
}

impl PortalCounters {
    /// Mean latency over all requests, 0 when none were recorded.
    pub fn avg_response_time(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cumulative_latency / self.total_requests as f64
        }
    }

    /// Success percentage, 0 when none were recorded.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64 * 100.0
        }
    }

    fn apply(&mut self, ev: &RequestEvent) {
        self.total_requests += 1;
        if ev.success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
        match ev.source {
            Source::Ui => self.ui_calls += 1,
            Source::Api => self.api_calls += 1,
        }
        self.cumulative_latency += ev.latency_seconds;
        self.last_used = Some(self.last_used.map_or(ev.timestamp, |t| t.max(ev.timestamp)));
    }

    /// Fold another portal's counters into this one.
    pub(crate) fn merge(&mut self, other: &PortalCounters) {
        self.total_requests += other.total_requests;
        self.successful_requests += other.successful_requests;
        self.failed_requests += other.failed_requests;
        self.ui_calls += other.ui_calls;
        self.api_calls += other.api_calls;
        self.cumulative_latency += other.cumulative_latency;
        self.last_used = match (self.last_used, other.last_used) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

struct Inner {
    portals: [PortalCounters; 3],
    recent: VecDeque<RequestEvent>,
}

impl Inner {
    fn empty(capacity: usize) -> Self {
        Self {
            portals: Default::default(),
            recent: VecDeque::with_capacity(capacity),
        }
    }
}

/// Thread-safe accumulator of request outcomes.
///
/// Construct once at startup and share through `Arc`.
pub struct MetricsAggregator {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RECENT_LOGS_CAPACITY,
            inner: Mutex::new(Inner::empty(DEFAULT_RECENT_LOGS_CAPACITY)),
        }
    }
}

impl MetricsAggregator {
    /// Aggregator with a recent-logs ring of `capacity` entries (min 1).
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CatalogBotError::BadRequest(
                "recent logs capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(Inner::empty(capacity)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Apply one outcome event.
    ///
    /// Invalid events are rejected before the lock is taken, leaving
    /// counters and logs untouched.
    pub fn record(&self, event: RequestEvent) -> Result<()> {
        event.validate()?;

        let mut g = self.inner.lock();
        g.portals[event.portal.index()].apply(&event);
        if g.recent.len() == self.capacity {
            g.recent.pop_front();
        }
        g.recent.push_back(event);
        Ok(())
    }

    /// Consistent point-in-time copy of all counters and the recent log.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (portals, recent_logs) = {
            let g = self.inner.lock();
            (g.portals.clone(), g.recent.iter().cloned().collect::<Vec<_>>())
        };

        let mut totals = PortalCounters::default();
        for p in &portals {
            totals.merge(p);
        }

        MetricsSnapshot { portals, totals, recent_logs }
    }

    /// Clear every counter and the recent log.
    pub fn reset(&self) {
        let mut g = self.inner.lock();
        *g = Inner::empty(self.capacity);
    }

    /// Counters for a single portal.
    pub fn portal(&self, portal: Portal) -> PortalCounters {
        self.inner.lock().portals[portal.index()].clone()
    }
}
