//! Bounded forwarding worker pool.
//!
//! # Responsibilities
//! - Run forward operations with a fixed concurrency bound
//! - Apply backpressure to the dispatcher when every worker is busy
//! - Drain in-flight forwards on shutdown, aborting what outlives the grace
//!   period

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time;

use crate::config::DispatcherConfig;
use crate::load_balancer::backend::Backend;
use crate::net::{Accepted, Forward};
use crate::observability::metrics;

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed-size pool of forwarding workers.
pub struct WorkerPool {
    /// One permit per worker slot.
    permits: Arc<Semaphore>,
    size: usize,
    forwarder: Arc<dyn Forward>,
    /// Forward tasks still tracked for abort on shutdown.
    tasks: Mutex<JoinSet<()>>,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Create a pool with `size` workers (at least one).
    pub fn new(size: usize, forwarder: Arc<dyn Forward>) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            forwarder,
            tasks: Mutex::new(JoinSet::new()),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    pub fn from_config(config: &DispatcherConfig, forwarder: Arc<dyn Forward>) -> Self {
        Self::new(config.worker_pool_size, forwarder)
            .with_shutdown_timeout(Duration::from_millis(config.shutdown_timeout_ms))
    }

    /// Grace period `drain` gives open forwards before aborting them.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Workers currently idle.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Hand a connection to a worker, waiting for a free slot.
    ///
    /// Returns `false` if the pool has been drained.
    pub async fn submit(&self, conn: Accepted, backend: Arc<Backend>) -> bool {
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(connection_id = %conn.id, "Worker pool closed, dropping connection");
                return false;
            }
        };

        let connection_id = conn.id;
        let task = self.forwarder.forward(conn, Arc::clone(&backend));

        let mut tasks = self.tasks();
        // Reap finished forwards so the set only holds open ones.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let _permit = permit;
            match task.await {
                Ok(stats) => tracing::debug!(
                    connection_id = %connection_id,
                    backend = %backend,
                    upstream_bytes = stats.upstream_bytes,
                    downstream_bytes = stats.downstream_bytes,
                    "Forward complete"
                ),
                Err(e) => {
                    metrics::record_forward_error();
                    tracing::warn!(connection_id = %connection_id, backend = %backend, error = %e, "Forward failed");
                }
            }
        });
        true
    }

    /// Wait up to the shutdown timeout for in-flight forwards, abort the
    /// rest, then refuse new work.
    pub async fn drain(&self) {
        let all = u32::try_from(self.size).unwrap_or(u32::MAX);
        match time::timeout(self.shutdown_timeout, self.permits.acquire_many(all)).await {
            Ok(Ok(permits)) => permits.forget(),
            Ok(Err(_)) => {}
            Err(_) => {
                let mut open = std::mem::take(&mut *self.tasks());
                tracing::warn!(
                    open = open.len(),
                    timeout = ?self.shutdown_timeout,
                    "Forwards still open after shutdown timeout, aborting"
                );
                open.shutdown().await;
            }
        }
        self.permits.close();
        tracing::info!(workers = self.size, "Worker pool drained");
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
