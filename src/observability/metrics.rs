//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): time to response headers
//! - `gateway_auth_failures_total` (counter): rejected credentials by reason
//! - `gateway_archives_total` (counter): archive builds by outcome
//! - `gateway_archive_bytes` (histogram): size of built archives
//!
//! Without an installed recorder every call here is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_auth_failure(reason: &'static str) {
    ::metrics::counter!("gateway_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_archive(outcome: &'static str, bytes: Option<u64>) {
    ::metrics::counter!("gateway_archives_total", "outcome" => outcome).increment(1);
    if let Some(bytes) = bytes {
        ::metrics::histogram!("gateway_archive_bytes").record(bytes as f64);
    }
}
