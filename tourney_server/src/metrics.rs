//! Prometheus metrics for monitoring the tournament server.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener
//! started by [`init_metrics`]. Without an exporter the recording functions
//! are no-ops.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tourney_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/matches", 201);
//! metrics::enrollments_total("capacity_error");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Count an enrollment attempt by result (`ok` or the error kind).
pub fn enrollments_total(result: &str) {
    metrics::counter!("enrollments_total", "result" => result.to_string()).increment(1);
}

/// Increment matches finalized counter.
pub fn matches_finalized_total() {
    metrics::counter!("matches_finalized_total").increment(1);
}

/// Increment placements recorded counter.
pub fn placements_recorded_total() {
    metrics::counter!("placements_recorded_total").increment(1);
}

/// Increment registered players counter.
pub fn players_registered_total() {
    metrics::counter!("players_registered_total").increment(1);
}
