//! Metrics collection and exposition.
//!
//! # Metrics
//! - `apm_transactions_total` (counter): finished transactions by app, status
//! - `apm_transaction_duration_seconds` (histogram): transaction latency
//! - `apm_transaction_errors_total` (counter): errors noticed on transactions
//! - `apm_segment_duration_seconds` (histogram): segment latency by name

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transaction(app: &str, status: Option<u16>, elapsed: Duration) {
    let status = status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string());
    counter!("apm_transactions_total", "app" => app.to_string(), "status" => status).increment(1);
    histogram!("apm_transaction_duration_seconds", "app" => app.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_error(app: &str) {
    counter!("apm_transaction_errors_total", "app" => app.to_string()).increment(1);
}

pub fn record_segment(name: &str, elapsed: Duration) {
    histogram!("apm_segment_duration_seconds", "segment" => name.to_string())
        .record(elapsed.as_secs_f64());
}
