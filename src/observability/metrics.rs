//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): responses by method, status, upstream
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_upstream_failures_total` (counter): transport failures by kind
//! - `gateway_tls_handshake_failures_total` (counter): dropped handshakes
//! - `gateway_upstream_in_flight` (gauge): upstream calls currently running
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is only installed when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, upstream: &str, started: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "upstream" => upstream.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(kind: &'static str) {
    ::metrics::counter!("gateway_upstream_failures_total", "kind" => kind).increment(1);
}

pub fn record_tls_handshake_failure() {
    ::metrics::counter!("gateway_tls_handshake_failures_total").increment(1);
}

/// Adjust the in-flight upstream call gauge by `delta`.
pub fn upstream_in_flight(delta: f64) {
    ::metrics::gauge!("gateway_upstream_in_flight").increment(delta);
}
