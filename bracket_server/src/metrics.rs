//! Prometheus metrics for monitoring bracket server health and throughput.
//!
//! Metrics are exposed in Prometheus text format when an exporter address is
//! configured; otherwise the recording calls are no-ops.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and duration
//! - **Generation Metrics**: Brackets generated per format, validation failures
//! - **Progression Metrics**: Results applied, active brackets
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bracket_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::brackets_generated_total("double-elimination");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Count a handled request by route template and status.
pub fn http_requests_total(method: &str, route: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, route: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Generation Metrics
// ============================================================================

/// Increment brackets generated counter for a format.
pub fn brackets_generated_total(tournament_type: &str) {
    metrics::counter!("brackets_generated_total",
        "tournament_type" => tournament_type.to_string()
    )
    .increment(1);
}

/// Increment rejected generation requests counter.
pub fn generation_rejected_total(reason: &str) {
    metrics::counter!("generation_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Increment validation failures counter.
pub fn validation_failures_total(tournament_type: &str) {
    metrics::counter!("validation_failures_total",
        "tournament_type" => tournament_type.to_string()
    )
    .increment(1);
}

/// Record generated bracket size.
pub fn bracket_matches(total_matches: u32) {
    metrics::histogram!("bracket_matches").record(total_matches as f64);
}

// ============================================================================
// Progression Metrics
// ============================================================================

/// Increment results applied counter.
pub fn results_applied_total() {
    metrics::counter!("results_applied_total").increment(1);
}

/// Increment completed brackets counter.
pub fn brackets_completed_total() {
    metrics::counter!("brackets_completed_total").increment(1);
}

/// Set current active brackets count.
pub fn active_brackets(count: usize) {
    metrics::gauge!("active_brackets").set(count as f64);
}
