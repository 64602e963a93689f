//! Metrics collection and exposition.
//!
//! # Metrics
//! - `page_front_dispatch_total` (counter): handler offers, by handler and outcome
//! - `page_front_upstream_failures_total` (counter): dev origin failures, by kind

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(handler: &'static str, outcome: &'static str) {
    ::metrics::counter!(
        "page_front_dispatch_total",
        "handler" => handler,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_upstream_failure(kind: &'static str) {
    ::metrics::counter!("page_front_upstream_failures_total", "kind" => kind).increment(1);
}
