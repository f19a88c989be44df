//! Admin operations against the registry and the health monitor.
//!
//! Transport-free so the HTTP handlers, startup seeding and tests share one
//! code path.

use std::sync::Arc;
use std::time::Duration;

use crate::health::active::MAX_COOLDOWN_SECS;
use crate::health::{HealthMonitor, Probe};
use crate::load_balancer::{Backend, BackendError, Registry, RegistryError};
use crate::observability::metrics::{self, EvictionSource};

/// Error type for admin operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    InvalidIdentity(#[from] BackendError),
    #[error("backend {0} failed its health probe")]
    Unhealthy(String),
    #[error(transparent)]
    Duplicate(#[from] RegistryError),
    #[error("backend {0} is not registered")]
    NotFound(String),
    #[error("cooldown must be between 1 and {} seconds", MAX_COOLDOWN_SECS)]
    InvalidCooldown,
}

/// Point-in-time view for `/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlStatus {
    pub backends: usize,
    pub cooldown_secs: u64,
    pub health_check_running: bool,
    pub completed_sweeps: u64,
}

/// The operations exposed to operators.
pub struct AdminControl {
    registry: Arc<Registry>,
    monitor: Arc<HealthMonitor>,
    probe: Arc<dyn Probe>,
}

impl AdminControl {
    pub fn new(registry: Arc<Registry>, monitor: Arc<HealthMonitor>, probe: Arc<dyn Probe>) -> Self {
        Self {
            registry,
            monitor,
            probe,
        }
    }

    /// Probe `identity` and register it only if healthy.
    pub async fn add_backend(&self, identity: &str) -> Result<Arc<Backend>, AdminError> {
        let backend = Backend::new(identity)?;
        if self.registry.contains(backend.identity()) {
            return Err(RegistryError::DuplicateIdentity(backend.identity().to_string()).into());
        }

        if !self.probe.probe(&backend).await {
            tracing::warn!(backend = %backend, "Rejected backend: initial probe failed");
            return Err(AdminError::Unhealthy(backend.identity().to_string()));
        }

        let backend = self.registry.add(backend)?;
        tracing::info!(backend = %backend, size = self.registry.len(), "Backend added");
        Ok(backend)
    }

    /// Remove `identity` if present.
    pub fn remove_backend(&self, identity: &str) -> Result<(), AdminError> {
        let identity = identity.trim();
        if !self.registry.remove_by_identity(identity) {
            return Err(AdminError::NotFound(identity.to_string()));
        }
        metrics::record_eviction(EvictionSource::Admin);
        tracing::info!(backend = %identity, size = self.registry.len(), "Backend removed");
        Ok(())
    }

    /// Registered identities in round-robin order.
    pub fn list_backends(&self) -> Vec<String> {
        self.registry.identities()
    }

    /// Restart the health sweep with a new cooldown.
    pub async fn set_cooldown(&self, seconds: u64) -> Result<(), AdminError> {
        if seconds == 0 || seconds > MAX_COOLDOWN_SECS {
            return Err(AdminError::InvalidCooldown);
        }
        self.monitor
            .set_cooldown(Duration::from_secs(seconds))
            .await
            .map_err(|_| AdminError::InvalidCooldown)
    }

    pub async fn status(&self) -> ControlStatus {
        ControlStatus {
            backends: self.registry.len(),
            cooldown_secs: self.monitor.cooldown().as_secs(),
            health_check_running: self.monitor.is_running().await,
            completed_sweeps: self.monitor.completed_sweeps(),
        }
    }
}
