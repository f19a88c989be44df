//! Balancer assembly.
//!
//! # Responsibilities
//! - Build the registry, probe, health monitor and admin control from a
//!   `BalancerConfig`
//! - Seed configured backends through the same probe-gated path as `/add`
//! - Run the dispatcher, the health sweep and the admin server until
//!   shutdown

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::admin::{setup_admin_router, AdminControl, AdminState};
use crate::config::BalancerConfig;
use crate::health::{HealthMonitor, HttpProbe, Probe};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Dispatcher, Registry, RoundRobin, WorkerPool};
use crate::net::{Listener, TcpForwarder};

/// The assembled load balancer.
pub struct BalancerServer {
    config: BalancerConfig,
    registry: Arc<Registry>,
    probe: Arc<dyn Probe>,
    monitor: Arc<HealthMonitor>,
    control: Arc<AdminControl>,
}

impl BalancerServer {
    /// Build every subsystem with an HTTP probe from the config.
    pub fn new(config: BalancerConfig) -> Self {
        let probe = Arc::new(HttpProbe::from_config(&config.health_check));
        Self::with_probe(config, probe)
    }

    pub fn with_probe(config: BalancerConfig, probe: Arc<dyn Probe>) -> Self {
        let registry = Arc::new(Registry::new());
        let monitor = Arc::new(HealthMonitor::from_config(
            Arc::clone(&registry),
            Arc::clone(&probe),
            &config.health_check,
        ));
        let control = Arc::new(AdminControl::new(
            Arc::clone(&registry),
            Arc::clone(&monitor),
            Arc::clone(&probe),
        ));

        Self {
            config,
            registry,
            probe,
            monitor,
            control,
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn monitor(&self) -> Arc<HealthMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn control(&self) -> Arc<AdminControl> {
        Arc::clone(&self.control)
    }

    pub fn admin_router(&self) -> Router {
        setup_admin_router(AdminState::new(
            Arc::clone(&self.control),
            self.config.admin.api_key.clone(),
        ))
    }

    /// Register the configured backends. Unhealthy or invalid entries are
    /// logged and skipped. Returns how many were registered.
    pub async fn seed_backends(&self) -> usize {
        let mut registered = 0;
        for entry in &self.config.backends {
            match self.control.add_backend(&entry.identity).await {
                Ok(_) => registered += 1,
                Err(e) => {
                    tracing::warn!(backend = %entry.identity, error = %e, "Skipping configured backend");
                }
            }
        }
        registered
    }

    /// Run until `shutdown` fires.
    ///
    /// `admin` is served when given; the caller binds it so bind failures
    /// surface before anything starts.
    pub async fn run(self, listener: Listener, admin: Option<TcpListener>, shutdown: &Shutdown) {
        let dispatcher_stop = shutdown.subscribe();
        let admin_task = admin.map(|admin| self.spawn_admin(admin, shutdown.subscribe()));

        let seeded = self.seed_backends().await;
        tracing::info!(
            configured = self.config.backends.len(),
            registered = seeded,
            "Startup backends registered"
        );

        if self.config.health_check.enabled {
            self.monitor.start().await;
        } else {
            tracing::info!("Health sweep disabled until a cooldown is set");
        }

        let round_robin = Arc::new(RoundRobin::from_config(
            Arc::clone(&self.registry),
            Arc::clone(&self.probe),
            &self.config.dispatcher,
        ));
        let forwarder = Arc::new(TcpForwarder::from_config(&self.config.forward));
        let pool = WorkerPool::from_config(&self.config.dispatcher, forwarder);

        Dispatcher::new(round_robin, pool)
            .run(listener, dispatcher_stop)
            .await;

        self.monitor.stop().await;

        if let Some(task) = admin_task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Admin server task failed");
            }
        }
        tracing::info!("Balancer stopped");
    }

    fn spawn_admin(&self, listener: TcpListener, mut stop: broadcast::Receiver<()>) -> JoinHandle<()> {
        let router = self.admin_router();

        tokio::spawn(async move {
            if let Ok(addr) = listener.local_addr() {
                tracing::info!(address = %addr, "Admin server listening");
            }
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin server error");
            }
        })
    }
}
