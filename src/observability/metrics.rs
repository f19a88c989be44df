//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_dispatched_total` (counter): connections handed to a backend, by backend
//! - `balancer_evictions_total` (counter): backends removed, by source
//! - `balancer_probes_total` (counter): health probes, by result
//! - `balancer_forward_errors_total` (counter): failed forward operations
//! - `balancer_backends` (gauge): current registry size
//!
//! Without an installed recorder every call is a no-op, which keeps tests
//! and embedded use free of exporter setup.

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Error type for exporter installation.
#[derive(Debug, thiserror::Error)]
#[error("failed to install Prometheus exporter: {0}")]
pub struct MetricsError(#[from] metrics_exporter_prometheus::BuildError);

/// Component that removed a backend from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionSource {
    Dispatcher,
    HealthCheck,
    Admin,
}

impl EvictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionSource::Dispatcher => "dispatcher",
            EvictionSource::HealthCheck => "health_check",
            EvictionSource::Admin => "admin",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(backend: &str) {
    metrics::counter!("balancer_dispatched_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_eviction(source: EvictionSource) {
    metrics::counter!("balancer_evictions_total", "source" => source.as_str()).increment(1);
}

pub fn record_probe(healthy: bool) {
    let result = if healthy { "healthy" } else { "unhealthy" };
    metrics::counter!("balancer_probes_total", "result" => result).increment(1);
}

pub fn record_forward_error() {
    metrics::counter!("balancer_forward_errors_total").increment(1);
}

pub fn set_backend_count(count: usize) {
    metrics::gauge!("balancer_backends").set(count as f64);
}
