//! Periodic snapshot poller.
//!
//! Mirrors the admin dashboard's refresh loop: every `poll_interval_ms` it
//! takes a snapshot and logs a one-line summary. Stops when the shutdown
//! channel flips to `true` or its sender is dropped, resolving to the
//! number of summaries taken.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

use catalogbot_core::Portal;

use super::aggregator::MetricsAggregator;
use super::snapshot::MetricsSnapshot;

/// Take one snapshot and log its summary.
pub fn poll_once(agg: &MetricsAggregator) -> MetricsSnapshot {
    let snap = agg.snapshot();
    let t = &snap.totals;
    tracing::info!(
        total = t.total_requests,
        successful = t.successful_requests,
        failed = t.failed_requests,
        ui = t.ui_calls,
        api = t.api_calls,
        success_rate = t.success_rate(),
        catalog_avg = snap.portal(Portal::Catalog).avg_response_time(),
        parts_avg = snap.portal(Portal::Parts).avg_response_time(),
        home_products_avg = snap.portal(Portal::HomeProducts).avg_response_time(),
        "portal metrics"
    );
    snap
}

pub fn spawn(
    agg: Arc<MetricsAggregator>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut polls = 0u64;
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately; skip it so the first summary is one interval in
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    poll_once(&agg);
                    polls += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!(polls, "snapshot poller stopping");
                        break;
                    }
                }
            }
        }
        polls
    })
}
