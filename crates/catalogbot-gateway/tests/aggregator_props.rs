//! Counter invariants and concurrent recording.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use catalogbot_core::{Portal, RequestEvent, Source};
use catalogbot_gateway::obs::{MetricsAggregator, MetricsSnapshot, PortalCounters};

/// Deterministic event stream cycling through portals, sources and outcomes.
fn event(i: usize) -> RequestEvent {
    let portal = Portal::ALL[i % 3];
    let source = if i % 4 == 0 { Source::Ui } else { Source::Api };
    let success = i % 5 != 0;
    RequestEvent::new(portal, source, success, (i % 7) as f64 * 0.5)
        .with_model_number(format!("M-{i}"))
}

fn assert_consistent(c: &PortalCounters) {
    assert_eq!(c.successful_requests + c.failed_requests, c.total_requests);
    assert_eq!(c.ui_calls + c.api_calls, c.total_requests);
    if c.total_requests > 0 {
        let expect = c.cumulative_latency / c.total_requests as f64;
        assert!((c.avg_response_time() - expect).abs() < 1e-9);
    } else {
        assert_eq!(c.avg_response_time(), 0.0);
    }
}

fn assert_snapshot_consistent(s: &MetricsSnapshot) {
    assert_consistent(&s.totals);
    for p in Portal::ALL {
        assert_consistent(s.portal(p));
    }
    let sum: u64 = Portal::ALL.iter().map(|p| s.portal(*p).total_requests).sum();
    assert_eq!(sum, s.totals.total_requests);
}

#[test]
fn totals_equal_number_of_events() {
    let agg = MetricsAggregator::default();
    for n in 0..200 {
        agg.record(event(n)).unwrap();
        let snap = agg.snapshot();
        assert_eq!(snap.totals.total_requests, n as u64 + 1);
        assert_snapshot_consistent(&snap);
    }
}

#[test]
fn ring_holds_last_capacity_events_after_overflow() {
    let capacity = 50;
    let extra = 17;
    let agg = MetricsAggregator::new(capacity).unwrap();
    for i in 0..capacity + extra {
        agg.record(event(i)).unwrap();
        assert!(agg.snapshot().recent_logs.len() <= capacity);
    }

    let snap = agg.snapshot();
    let models: Vec<String> = snap
        .recent_logs
        .iter()
        .map(|e| e.model_number.clone().unwrap())
        .collect();
    let expect: Vec<String> = (extra..capacity + extra).map(|i| format!("M-{i}")).collect();
    assert_eq!(models, expect);
}

#[test]
fn interleaved_portals_sum_into_totals() {
    let agg = MetricsAggregator::default();
    let plan = [
        (Portal::Parts, Source::Ui, true, 0.5),
        (Portal::Catalog, Source::Api, true, 1.5),
        (Portal::HomeProducts, Source::Ui, false, 2.0),
        (Portal::Parts, Source::Api, false, 3.0),
        (Portal::Catalog, Source::Ui, true, 1.0),
        (Portal::HomeProducts, Source::Api, true, 4.0),
    ];
    for (p, s, ok, lat) in plan {
        agg.record(RequestEvent::new(p, s, ok, lat)).unwrap();
    }

    let snap = agg.snapshot();
    assert_eq!(snap.portal(Portal::Parts).total_requests, 2);
    assert_eq!(snap.portal(Portal::Catalog).total_requests, 2);
    assert_eq!(snap.portal(Portal::HomeProducts).total_requests, 2);
    assert_eq!(snap.totals.total_requests, 6);
    assert_eq!(snap.totals.successful_requests, 4);
    assert_eq!(snap.totals.failed_requests, 2);
    assert_eq!(snap.totals.ui_calls, 3);
    assert_eq!(snap.totals.api_calls, 3);
    assert!((snap.totals.avg_response_time() - 2.0).abs() < 1e-9);
    assert_snapshot_consistent(&snap);
}

#[test]
fn reset_is_idempotent() {
    let agg = MetricsAggregator::default();
    for i in 0..10 {
        agg.record(event(i)).unwrap();
    }

    agg.reset();
    let once = serde_json::to_value(agg.snapshot()).unwrap();
    agg.reset();
    let twice = serde_json::to_value(agg.snapshot()).unwrap();

    assert_eq!(once, twice);
    assert!(agg.snapshot().is_empty());
    assert_eq!(once["totals"]["total_requests"], 0);
}

#[test]
fn counters_resume_after_reset() {
    let agg = MetricsAggregator::default();
    agg.record(event(1)).unwrap();
    agg.reset();
    agg.record(event(2)).unwrap();
    assert_eq!(agg.snapshot().totals.total_requests, 1);
}

#[test]
fn concurrent_records_lose_no_updates() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;

    let agg = Arc::new(MetricsAggregator::new(64).unwrap());
    let mut handles = Vec::new();
    for t in 0..THREADS {
        let agg = Arc::clone(&agg);
        handles.push(thread::spawn(move || {
            for i in 0..PER_THREAD {
                agg.record(event(t * PER_THREAD + i)).unwrap();
            }
        }));
    }

    // concurrent reader: every snapshot must be internally consistent
    let reader = {
        let agg = Arc::clone(&agg);
        thread::spawn(move || {
            for _ in 0..200 {
                let snap = agg.snapshot();
                assert_snapshot_consistent(&snap);
                assert!(snap.recent_logs.len() <= 64);
            }
        })
    };

    for h in handles {
        h.join().unwrap();
    }
    reader.join().unwrap();

    let snap = agg.snapshot();
    assert_eq!(snap.totals.total_requests, (THREADS * PER_THREAD) as u64);
    assert_eq!(snap.recent_logs.len(), 64);
    assert_snapshot_consistent(&snap);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_lose_no_updates() {
    let agg = Arc::new(MetricsAggregator::default());
    let mut tasks = Vec::new();
    for i in 0..1_000 {
        let agg = Arc::clone(&agg);
        tasks.push(tokio::spawn(async move { agg.record(event(i)) }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }
    assert_eq!(agg.snapshot().totals.total_requests, 1_000);
}
