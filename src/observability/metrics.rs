//! Metrics collection.
//!
//! # Metrics
//! - `router_requests_total` (counter): invocations by method, status, route
//! - `router_request_duration_seconds` (histogram): dispatch latency
//! - `router_errors_total` (counter): failures by kind and trust
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; without a recorder they are no-ops
//! - Route label is the template, never the concrete path (bounded cardinality)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Label used when no route was matched.
pub const UNMATCHED: &str = "none";

/// Record a finished invocation.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "router_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a failure translated into an error response.
pub fn record_error(kind: &str, trusted: bool) {
    metrics::counter!(
        "router_errors_total",
        "kind" => kind.to_string(),
        "trusted" => trusted.to_string()
    )
    .increment(1);
}

/// Install a Prometheus recorder with a scrape endpoint. Must be called from
/// within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}
