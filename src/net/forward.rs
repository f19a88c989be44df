//! Raw TCP forwarding.
//!
//! # Responsibilities
//! - Open a connection to the selected backend
//! - Relay bytes in both directions until both sides close
//!
//! # Design Decisions
//! - Protocol agnostic: the byte stream is never parsed
//! - Outcomes are reported to the caller only; they never touch the registry

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::copy_bidirectional;
use tokio::net::TcpStream;
use tokio::time;

use crate::config::ForwardConfig;
use crate::load_balancer::backend::Backend;
use crate::net::connection::Accepted;

/// Error type for forward operations.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("connect to {backend} timed out after {timeout:?}")]
    ConnectTimeout { backend: String, timeout: Duration },
    #[error("connect to {backend} failed: {source}")]
    Connect {
        backend: String,
        #[source]
        source: std::io::Error,
    },
    #[error("relay failed: {0}")]
    Relay(#[source] std::io::Error),
}

/// Bytes moved by one forward operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    /// Client → backend.
    pub upstream_bytes: u64,
    /// Backend → client.
    pub downstream_bytes: u64,
}

/// Relays an accepted connection to a backend.
pub trait Forward: Send + Sync + 'static {
    fn forward(&self, conn: Accepted, backend: Arc<Backend>) -> BoxFuture<'static, Result<ForwardStats, ForwardError>>;
}

/// Plain TCP relay with a connect timeout.
#[derive(Debug, Clone)]
pub struct TcpForwarder {
    connect_timeout: Duration,
}

impl TcpForwarder {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn from_config(config: &ForwardConfig) -> Self {
        Self::new(Duration::from_millis(config.connect_timeout_ms))
    }
}

impl Forward for TcpForwarder {
    fn forward(&self, conn: Accepted, backend: Arc<Backend>) -> BoxFuture<'static, Result<ForwardStats, ForwardError>> {
        let timeout = self.connect_timeout;
        Box::pin(async move {
            let authority = backend.authority();
            let mut upstream = match time::timeout(timeout, TcpStream::connect(authority.as_str())).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(source)) => {
                    return Err(ForwardError::Connect {
                        backend: backend.identity().to_string(),
                        source,
                    })
                }
                Err(_) => {
                    return Err(ForwardError::ConnectTimeout {
                        backend: backend.identity().to_string(),
                        timeout,
                    })
                }
            };
            let _ = upstream.set_nodelay(true);

            let mut client = conn.stream;
            let (upstream_bytes, downstream_bytes) = copy_bidirectional(&mut client, &mut upstream)
                .await
                .map_err(ForwardError::Relay)?;

            Ok(ForwardStats {
                upstream_bytes,
                downstream_bytes,
            })
        })
    }
}
