//! Top-level error type for the balancer binary.

use crate::config::ConfigError;
use crate::net::ListenerError;
use crate::observability::metrics::MetricsError;

#[derive(Debug, thiserror::Error)]
pub enum BalancerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("metrics exporter error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("config watcher error: {0}")]
    Watch(#[from] notify::Error),
}
