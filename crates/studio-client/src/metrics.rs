//! Client metrics.
//!
//! Recorded through the `metrics` facade; installing an exporter is up to
//! the binary.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total backend requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "studio_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "studio_request_latency_seconds";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "studio_retries_total";

    /// Pipeline events dropped before reaching state, by reason.
    pub const EVENTS_DISCARDED_TOTAL: &str = "studio_events_discarded_total";

    /// Render completions announced to the user.
    pub const RENDER_READY_TOTAL: &str = "studio_render_ready_total";
}

/// Record metrics for a completed backend request.
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

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a dropped pipeline event.
pub fn record_event_discarded(reason: &'static str) {
    counter!(names::EVENTS_DISCARDED_TOTAL, "reason" => reason).increment(1);
}

/// Record a render-ready notification.
pub fn record_render_ready() {
    counter!(names::RENDER_READY_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.starts_with("studio_"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
        assert!(names::EVENTS_DISCARDED_TOTAL.contains("discarded"));
    }
}
