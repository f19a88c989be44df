//! Round-robin backend selection.
//!
//! # Selection
//! ```text
//! loop:
//!     registry empty?          → idle backoff (woken early by an add)
//!     index = cursor mod len   → fresh snapshot every attempt
//!     probe(backend)
//!         healthy              → cursor += 1, return backend
//!         unhealthy            → evict, retry (cursor unchanged)
//! ```
//!
//! The cursor advances once per dispatched connection, never per probe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time;

use crate::config::DispatcherConfig;
use crate::health::probe::Probe;
use crate::load_balancer::backend::Backend;
use crate::load_balancer::registry::Registry;
use crate::observability::metrics::{self, EvictionSource};
use crate::resilience::backoff::IdleBackoff;

/// Round-robin selector with an inline health gate.
pub struct RoundRobin {
    registry: Arc<Registry>,
    probe: Arc<dyn Probe>,
    /// Dispatch cursor. Only the dispatcher advances it.
    request_count: AtomicU64,
    idle_base_ms: u64,
    idle_max_ms: u64,
}

impl RoundRobin {
    pub fn new(registry: Arc<Registry>, probe: Arc<dyn Probe>) -> Self {
        Self::with_idle_backoff(registry, probe, 10, 500)
    }

    pub fn from_config(registry: Arc<Registry>, probe: Arc<dyn Probe>, config: &DispatcherConfig) -> Self {
        Self::with_idle_backoff(registry, probe, config.idle_backoff_base_ms, config.idle_backoff_max_ms)
    }

    pub fn with_idle_backoff(
        registry: Arc<Registry>,
        probe: Arc<dyn Probe>,
        idle_base_ms: u64,
        idle_max_ms: u64,
    ) -> Self {
        Self {
            registry,
            probe,
            request_count: AtomicU64::new(0),
            idle_base_ms,
            idle_max_ms,
        }
    }

    /// Current cursor value (number of dispatched connections).
    pub fn cursor(&self) -> u64 {
        self.request_count.load(Ordering::Acquire)
    }

    /// Select the next healthy backend, evicting unhealthy ones on the way.
    ///
    /// Waits as long as needed; if no backend ever becomes available the
    /// future never resolves.
    pub async fn next_backend(&self) -> Arc<Backend> {
        let mut idle = IdleBackoff::new(self.idle_base_ms, self.idle_max_ms);

        loop {
            let snapshot = self.registry.snapshot();
            if snapshot.is_empty() {
                let delay = idle.next_delay();
                tracing::trace!(delay = ?delay, "No backends registered, waiting");
                tokio::select! {
                    _ = self.registry.backend_added() => {}
                    _ = time::sleep(delay) => {}
                }
                continue;
            }

            let count = self.request_count.load(Ordering::Acquire);
            let index = (count % snapshot.len() as u64) as usize;
            let backend = Arc::clone(&snapshot[index]);

            if self.probe.probe(&backend).await {
                self.request_count.fetch_add(1, Ordering::AcqRel);
                return backend;
            }

            if self.registry.remove_by_reference(&backend) {
                metrics::record_eviction(EvictionSource::Dispatcher);
                tracing::warn!(backend = %backend, index, "Removing unhealthy backend and checking next one");
            } else {
                tracing::debug!(backend = %backend, "Unhealthy backend already removed");
            }
            idle.reset();
        }
    }
}
