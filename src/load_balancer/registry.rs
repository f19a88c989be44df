//! Backend registry.
//!
//! # Responsibilities
//! - Hold the ordered set of live backends (order = round-robin order)
//! - Reject duplicate identities
//! - Serve lock-free point-in-time snapshots to the dispatcher and the
//!   health checker
//! - Wake idle dispatchers when a backend is added
//!
//! # Design Decisions
//! - Copy-on-write: every mutation builds a new `Vec` and publishes it with
//!   an atomic swap, so readers never observe a half-applied change
//! - Writers are serialized by a mutex; the critical section never awaits
//!   and never probes
//! - Removal is idempotent; losing a removal race returns `false`

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use tokio::sync::Notify;

use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

/// Immutable view of the registry at one instant.
pub type Snapshot = Arc<Vec<Arc<Backend>>>;

/// Error type for registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A backend with the same identity is already registered.
    #[error("backend {0} is already registered")]
    DuplicateIdentity(String),
}

/// Thread-safe ordered collection of backends.
#[derive(Debug)]
pub struct Registry {
    /// Current published sequence.
    backends: ArcSwap<Vec<Arc<Backend>>>,
    /// Serializes writers.
    writer: Mutex<()>,
    /// Signalled after every successful add.
    added: Notify,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            backends: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
            added: Notify::new(),
        }
    }

    /// Append a backend. Fails if its identity is already present.
    pub fn add(&self, backend: Backend) -> Result<Arc<Backend>, RegistryError> {
        let backend = Arc::new(backend);
        let size = {
            let _guard = self.write_lock();
            let current = self.backends.load_full();

            if current.iter().any(|b| **b == *backend) {
                return Err(RegistryError::DuplicateIdentity(backend.identity().to_string()));
            }

            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&backend));
            let size = next.len();
            self.backends.store(Arc::new(next));
            size
        };

        metrics::set_backend_count(size);
        tracing::debug!(backend = %backend, size, "Backend registered");
        self.added.notify_waiters();
        Ok(backend)
    }

    /// Remove the first backend with the given identity.
    pub fn remove_by_identity(&self, identity: &str) -> bool {
        self.remove_first(|b| b.identity() == identity)
    }

    /// Remove the entry a caller holds a handle to.
    ///
    /// Returns `false` when it was already removed by someone else.
    pub fn remove_by_reference(&self, backend: &Backend) -> bool {
        self.remove_first(|b| b == backend)
    }

    fn remove_first<F>(&self, matches: F) -> bool
    where
        F: Fn(&Backend) -> bool,
    {
        let (removed, size) = {
            let _guard = self.write_lock();
            let current = self.backends.load_full();

            let Some(position) = current.iter().position(|b| matches(&**b)) else {
                return false;
            };

            let mut next: Vec<Arc<Backend>> = Vec::with_capacity(current.len() - 1);
            next.extend(current[..position].iter().cloned());
            next.extend(current[position + 1..].iter().cloned());
            let size = next.len();
            self.backends.store(Arc::new(next));
            (Arc::clone(&current[position]), size)
        };

        metrics::set_backend_count(size);
        tracing::debug!(backend = %removed, size, "Backend removed");
        true
    }

    /// Consistent point-in-time copy for iteration.
    pub fn snapshot(&self) -> Snapshot {
        self.backends.load_full()
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Backend at `index` in the current snapshot.
    pub fn at(&self, index: usize) -> Option<Arc<Backend>> {
        self.backends.load().get(index).cloned()
    }

    /// Whether a backend with this identity is registered.
    pub fn contains(&self, identity: &str) -> bool {
        self.backends.load().iter().any(|b| b.identity() == identity)
    }

    /// Identities in registry order.
    pub fn identities(&self) -> Vec<String> {
        self.backends
            .load()
            .iter()
            .map(|b| b.identity().to_string())
            .collect()
    }

    /// Resolves on the next successful `add` after this future is created.
    ///
    /// An add landing between a caller's `snapshot()` and this call is not
    /// observed, so callers pair it with a bounded sleep.
    pub async fn backend_added(&self) {
        self.added.notified().await;
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
