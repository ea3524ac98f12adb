//! Prometheus metrics for mocknest-server.
//!
//! Tracks mock resolution outcomes, preset activations, invariant anomalies,
//! and admin API traffic. Exposed as text via `GET /metrics` on the admin
//! listener.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// Requests handled by the mock listener, by resolution outcome
    pub static ref MOCK_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "mocknest_mock_requests_total",
        "Total number of requests handled by the mock listener",
        &["method", "outcome"]  // outcome: served|endpoint_not_found|no_active_preset|method_not_allowed
    )
    .unwrap();

    /// Mock request handling duration in milliseconds
    pub static ref MOCK_REQUEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "mocknest_mock_request_duration_ms",
        "Histogram of mock request handling time in milliseconds",
        &["method", "outcome"],
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .unwrap();

    /// Times the store yielded more than one enabled preset for an endpoint
    pub static ref INVARIANT_VIOLATIONS_TOTAL: Counter = register_counter!(
        "mocknest_invariant_violations_total",
        "Times more than one enabled preset was observed for a single endpoint"
    )
    .unwrap();

    /// Preset activation attempts
    pub static ref PRESET_ACTIVATIONS_TOTAL: CounterVec = register_counter_vec!(
        "mocknest_preset_activations_total",
        "Total number of preset activation attempts",
        &["result"]  // result: success|error
    )
    .unwrap();

    /// Requests handled by the admin listener
    pub static ref ADMIN_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "mocknest_admin_requests_total",
        "Total number of requests handled by the admin API",
        &["method", "status"]
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Helper to record a mock-listener request
pub fn record_mock_request(method: &str, outcome: &str, duration_ms: f64) {
    MOCK_REQUESTS_TOTAL
        .with_label_values(&[method, outcome])
        .inc();
    MOCK_REQUEST_DURATION_MS
        .with_label_values(&[method, outcome])
        .observe(duration_ms);
}

/// Helper to record an observed single-active-preset violation
pub fn record_invariant_violation() {
    INVARIANT_VIOLATIONS_TOTAL.inc();
}

/// Helper to record a preset activation attempt
pub fn record_preset_activation(success: bool) {
    let result = if success { "success" } else { "error" };
    PRESET_ACTIVATIONS_TOTAL.with_label_values(&[result]).inc();
}

/// Helper to record an admin API request
pub fn record_admin_request(method: &str, status: u16) {
    ADMIN_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
}
