//! In-process observability: the portal metrics aggregator, its snapshot
//! wire format, the Prometheus text registry, and the snapshot poller.

pub mod aggregator;
pub mod metrics;
pub mod poller;
pub mod snapshot;

pub use aggregator::{MetricsAggregator, PortalCounters, DEFAULT_RECENT_LOGS_CAPACITY};
pub use metrics::GatewayMetrics;
pub use snapshot::MetricsSnapshot;
