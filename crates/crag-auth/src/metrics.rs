//! Identity request metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total identity requests by operation and outcome.
    pub const REQUESTS_TOTAL: &str = "auth_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "auth_latency_seconds";
}

/// Record metrics for a completed identity request.
pub fn record_request(operation: &str, outcome: &str, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}
