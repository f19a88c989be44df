//! Accept loop.
//!
//! # Responsibilities
//! - Accept connections on the data port
//! - Ask the round-robin selector for a healthy backend, holding the
//!   connection until one is found
//! - Hand `{connection, backend}` to the worker pool
//!
//! # Design Decisions
//! - One dispatcher task; it is the only writer of the dispatch cursor
//! - Accept errors are logged and retried, never fatal
//! - Shutdown interrupts the accept, a pending selection and a wait for a
//!   free worker

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::load_balancer::pool::WorkerPool;
use crate::load_balancer::round_robin::RoundRobin;
use crate::net::Listener;
use crate::observability::metrics;

/// Pause after a failed accept (e.g. descriptor exhaustion).
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(50);

/// Drives accepted connections to backends.
pub struct Dispatcher {
    balancer: Arc<RoundRobin>,
    pool: WorkerPool,
}

impl Dispatcher {
    pub fn new(balancer: Arc<RoundRobin>, pool: WorkerPool) -> Self {
        Self { balancer, pool }
    }

    /// Run until the shutdown signal fires, then drain the pool.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(workers = self.pool.size(), "Dispatcher started");

        loop {
            let conn = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        time::sleep(ACCEPT_ERROR_PAUSE).await;
                        continue;
                    }
                },
                _ = shutdown.recv() => break,
            };

            let backend = tokio::select! {
                backend = self.balancer.next_backend() => backend,
                _ = shutdown.recv() => {
                    tracing::info!(connection_id = %conn.id, "Shutdown while selecting backend, dropping connection");
                    break;
                }
            };

            tracing::debug!(
                connection_id = %conn.id,
                peer_addr = %conn.peer,
                backend = %backend,
                cursor = self.balancer.cursor(),
                "Forwarding connection"
            );
            metrics::record_dispatch(backend.identity());

            let submitted = tokio::select! {
                submitted = self.pool.submit(conn, backend) => submitted,
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown while waiting for a free worker, dropping connection");
                    false
                }
            };
            if !submitted {
                break;
            }
        }

        tracing::info!("Dispatcher stopping");
        self.pool.drain().await;
    }
}
