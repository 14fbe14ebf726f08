//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): inbound requests by status
//! - `relay_request_duration_seconds` (histogram): inbound latency
//! - `relay_fetch_total` (counter): quote source calls by outcome
//! - `relay_fetch_duration_seconds` (histogram): quote source latency
//! - `relay_persist_total` (counter): sink writes by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is opt-in

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one answered inbound request.
pub fn record_request(status: u16, start: Instant) {
    counter!("relay_requests_total", "status" => status.to_string()).increment(1);
    histogram!("relay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one call to the quote source.
pub fn record_fetch(outcome: &'static str, start: Instant) {
    counter!("relay_fetch_total", "outcome" => outcome).increment(1);
    histogram!("relay_fetch_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one persist attempt.
pub fn record_persist(outcome: &'static str) {
    counter!("relay_persist_total", "outcome" => outcome).increment(1);
}
