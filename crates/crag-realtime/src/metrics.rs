//! Realtime database metrics collection.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total node operations by operation and status.
    pub const REQUESTS_TOTAL: &str = "rtdb_requests_total";

    /// Node operation latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "rtdb_latency_seconds";

    /// Total listener connections opened by path.
    pub const WATCH_STREAMS_OPENED_TOTAL: &str = "rtdb_watch_streams_opened_total";
}

/// Record metrics for a completed node operation.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a newly opened listener connection.
pub fn record_watch_opened(path: &str) {
    counter!(
        names::WATCH_STREAMS_OPENED_TOTAL,
        "path" => path.to_string()
    )
    .increment(1);
}
