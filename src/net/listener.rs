//! TCP listener for the balancer's data port.
//!
//! # Responsibilities
//! - Bind to the configured address (failure is fatal at startup)
//! - Accept incoming TCP connections and tag them with a connection ID

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;
use crate::net::connection::Accepted;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// The data-port listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

/// Bind a plain tokio listener, mapping every failure to `ListenerError::Bind`.
pub async fn bind_tcp(address: &str) -> Result<TcpListener, ListenerError> {
    let bind_error = |source| ListenerError::Bind {
        address: address.to_string(),
        source,
    };

    let addr: SocketAddr = address
        .parse()
        .map_err(|e| bind_error(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    TcpListener::bind(addr).await.map_err(bind_error)
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let listener = bind_tcp(&config.bind_address).await?;
        let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner: listener })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<Accepted, ListenerError> {
        let (stream, peer) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        let accepted = Accepted::new(stream, peer);

        tracing::debug!(connection_id = %accepted.id, peer_addr = %peer, "Connection accepted");
        Ok(accepted)
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}
