//! Platform request metrics.
//!
//! Provides standardized metrics for monitoring platform API traffic:
//! - Request counters by platform, operation and status
//! - Latency histograms
//! - Rate-limit retry counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total platform requests by platform, operation and status.
    pub const REQUESTS_TOTAL: &str = "platform_requests_total";

    /// Total rate-limit retries by platform.
    pub const RETRIES_TOTAL: &str = "platform_retries_total";

    /// Request latency in seconds by platform and operation.
    pub const LATENCY_SECONDS: &str = "platform_latency_seconds";
}

/// Record metrics for a completed platform request.
pub fn record_request(platform: &str, operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "platform" => platform.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "platform" => platform.to_string(),
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a rate-limit retry attempt.
pub fn record_retry(platform: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "platform" => platform.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::RETRIES_TOTAL.contains("retries"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
    }
}
