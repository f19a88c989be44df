//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered backend
//! - Evict backends whose probe fails
//! - Restart the sweep with a new cooldown on request
//!
//! # Design Decisions
//! - Exactly one sweep task exists at a time. Reconfiguration stops the old
//!   task and awaits its exit before spawning the new one, all under the
//!   supervisor lock
//! - The stop flag is a `watch` channel so a sleeping or probing task wakes
//!   immediately instead of waiting out the old interval
//! - The cooldown lives in an atomic, independent from the registry

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::probe::Probe;
use crate::load_balancer::registry::Registry;
use crate::observability::metrics::{self, EvictionSource};

/// Longest cooldown that still fits the millisecond store.
pub const MAX_COOLDOWN_SECS: u64 = u64::MAX / 1000;

/// Error type for health monitor reconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HealthError {
    /// Cooldowns must be strictly positive.
    #[error("cooldown must be greater than zero")]
    ZeroCooldown,
    /// Cooldowns above `MAX_COOLDOWN_SECS` cannot be stored exactly.
    #[error("cooldown must not exceed {} seconds", MAX_COOLDOWN_SECS)]
    CooldownTooLarge,
}

/// Handle on the running sweep task.
struct SweepTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
    generation: u64,
}

/// Supervises the single background sweep task.
pub struct HealthMonitor {
    registry: Arc<Registry>,
    probe: Arc<dyn Probe>,
    cooldown_ms: AtomicU64,
    current: Mutex<Option<SweepTask>>,
    generation: AtomicU64,
    sweeps: Arc<AtomicU64>,
    sweeping: Arc<AtomicBool>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<Registry>, probe: Arc<dyn Probe>, cooldown: Duration) -> Self {
        Self {
            registry,
            probe,
            cooldown_ms: AtomicU64::new(duration_to_ms(cooldown)),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
            sweeps: Arc::new(AtomicU64::new(0)),
            sweeping: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(registry: Arc<Registry>, probe: Arc<dyn Probe>, config: &HealthCheckConfig) -> Self {
        Self::new(registry, probe, Duration::from_secs(config.cooldown_secs))
    }

    /// Start sweeping with the current cooldown. No-op if already running.
    pub async fn start(&self) {
        let mut current = self.current.lock().await;
        if current.is_some() {
            return;
        }
        *current = Some(self.spawn_sweep());
    }

    /// Replace the running sweep with one using `cooldown`.
    ///
    /// Returns once the previous task has exited and the new one is spawned.
    pub async fn set_cooldown(&self, cooldown: Duration) -> Result<(), HealthError> {
        if cooldown.is_zero() {
            return Err(HealthError::ZeroCooldown);
        }
        if cooldown.as_secs() > MAX_COOLDOWN_SECS {
            return Err(HealthError::CooldownTooLarge);
        }

        let mut current = self.current.lock().await;
        if let Some(old) = current.take() {
            Self::terminate(old).await;
        }

        let previous = self.cooldown_ms.swap(duration_to_ms(cooldown), Ordering::SeqCst);
        tracing::info!(
            previous_ms = previous,
            cooldown_ms = duration_to_ms(cooldown),
            "Health check cooldown updated"
        );

        *current = Some(self.spawn_sweep());
        Ok(())
    }

    /// Stop sweeping and wait for the task to exit.
    pub async fn stop(&self) {
        let mut current = self.current.lock().await;
        if let Some(old) = current.take() {
            Self::terminate(old).await;
            tracing::info!("Health monitor stopped");
        }
    }

    /// Current interval between sweeps.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms.load(Ordering::SeqCst))
    }

    pub async fn is_running(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// Number of full sweeps finished since construction.
    pub fn completed_sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::SeqCst)
    }

    fn spawn_sweep(&self) -> SweepTask {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (stop, stop_rx) = watch::channel(false);
        let sweep = Sweep {
            registry: Arc::clone(&self.registry),
            probe: Arc::clone(&self.probe),
            cooldown: self.cooldown(),
            sweeps: Arc::clone(&self.sweeps),
            sweeping: Arc::clone(&self.sweeping),
            generation,
        };

        tracing::info!(generation, cooldown = ?sweep.cooldown, "Health monitor starting");
        let handle = tokio::spawn(sweep.run(stop_rx));
        SweepTask { stop, handle, generation }
    }

    async fn terminate(task: SweepTask) {
        let _ = task.stop.send(true);
        if let Err(e) = task.handle.await {
            tracing::error!(generation = task.generation, error = %e, "Sweep task ended abnormally");
        }
        tracing::debug!(generation = task.generation, "Sweep task exited");
    }
}

/// State owned by one sweep task.
struct Sweep {
    registry: Arc<Registry>,
    probe: Arc<dyn Probe>,
    cooldown: Duration,
    sweeps: Arc<AtomicU64>,
    sweeping: Arc<AtomicBool>,
    generation: u64,
}

impl Sweep {
    async fn run(self, mut stop: watch::Receiver<bool>) {
        loop {
            if *stop.borrow() {
                break;
            }

            if !self.sweep_once(&mut stop).await {
                break;
            }
            self.sweeps.fetch_add(1, Ordering::SeqCst);

            tokio::select! {
                _ = time::sleep(self.cooldown) => {}
                _ = stop.changed() => break,
            }
        }
        tracing::debug!(generation = self.generation, "Sweep loop exiting");
    }

    /// One pass over a registry snapshot. Returns `false` if stopped midway.
    async fn sweep_once(&self, stop: &mut watch::Receiver<bool>) -> bool {
        if self.sweeping.swap(true, Ordering::SeqCst) {
            tracing::error!(generation = self.generation, "Overlapping sweep detected");
        }

        let snapshot = self.registry.snapshot();
        tracing::debug!(generation = self.generation, backends = snapshot.len(), "Sweep started");

        let mut completed = true;
        for backend in snapshot.iter() {
            if *stop.borrow() {
                completed = false;
                break;
            }

            let healthy = tokio::select! {
                healthy = self.probe.probe(backend) => healthy,
                _ = stop.changed() => {
                    completed = false;
                    break;
                }
            };

            if !healthy && self.registry.remove_by_reference(backend) {
                metrics::record_eviction(EvictionSource::HealthCheck);
                tracing::warn!(backend = %backend, "Evicted unhealthy backend");
            }
        }

        self.sweeping.store(false, Ordering::SeqCst);
        completed
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::testing::ScriptedProbe;
    use crate::load_balancer::backend::Backend;

    fn registry_with(ids: &[&str]) -> Arc<Registry> {
        let registry = Arc::new(Registry::new());
        for id in ids {
            registry.add(Backend::new(*id).unwrap()).unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_sweep_evicts_failures() {
        let registry = registry_with(&["a", "b", "c"]);
        let probe = Arc::new(ScriptedProbe::new());
        probe.set("a", true);
        probe.set("b", false);
        probe.set("c", true);

        let monitor = HealthMonitor::new(registry.clone(), probe.clone(), Duration::from_millis(50));
        monitor.start().await;
        time::sleep(Duration::from_millis(120)).await;

        assert_eq!(registry.identities(), vec!["a", "c"]);
        assert!(monitor.completed_sweeps() >= 2);
        monitor.stop().await;
        assert!(!monitor.is_running().await);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let registry = registry_with(&["a"]);
        let probe = Arc::new(ScriptedProbe::with_delay(Duration::from_millis(5)));
        probe.set("a", true);

        let monitor = HealthMonitor::new(registry, probe.clone(), Duration::from_millis(1));
        monitor.start().await;
        monitor.start().await;
        time::sleep(Duration::from_millis(60)).await;
        monitor.stop().await;

        assert_eq!(probe.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_zero_cooldown_rejected() {
        let registry = registry_with(&[]);
        let probe = Arc::new(ScriptedProbe::new());
        let monitor = HealthMonitor::new(registry, probe, Duration::from_secs(5));

        assert_eq!(monitor.set_cooldown(Duration::ZERO).await, Err(HealthError::ZeroCooldown));
        assert_eq!(monitor.cooldown(), Duration::from_secs(5));
        assert!(!monitor.is_running().await);
    }

    #[tokio::test]
    async fn test_oversized_cooldown_rejected() {
        let registry = registry_with(&[]);
        let probe = Arc::new(ScriptedProbe::new());
        let monitor = HealthMonitor::new(registry, probe, Duration::from_secs(5));

        assert_eq!(
            monitor.set_cooldown(Duration::from_secs(u64::MAX)).await,
            Err(HealthError::CooldownTooLarge)
        );
        assert_eq!(monitor.cooldown(), Duration::from_secs(5));
        assert!(!monitor.is_running().await);

        monitor.set_cooldown(Duration::from_secs(MAX_COOLDOWN_SECS)).await.unwrap();
        assert_eq!(monitor.cooldown().as_secs(), MAX_COOLDOWN_SECS);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_reconfiguration_never_overlaps() {
        let registry = registry_with(&["a", "b", "c"]);
        let probe = Arc::new(ScriptedProbe::with_delay(Duration::from_millis(3)));
        for id in ["a", "b", "c"] {
            probe.set(id, true);
        }

        let monitor = Arc::new(HealthMonitor::new(registry.clone(), probe.clone(), Duration::from_millis(1)));
        monitor.start().await;

        let mut reconfigurers = Vec::new();
        for i in 1..=4u64 {
            let monitor = Arc::clone(&monitor);
            reconfigurers.push(tokio::spawn(async move {
                for j in 0..5u64 {
                    monitor
                        .set_cooldown(Duration::from_millis(i + j))
                        .await
                        .unwrap();
                    time::sleep(Duration::from_millis(4)).await;
                }
            }));
        }
        for r in reconfigurers {
            r.await.unwrap();
        }
        time::sleep(Duration::from_millis(30)).await;
        monitor.stop().await;

        assert_eq!(probe.max_in_flight(), 1, "two sweep tasks probed at once");
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_set_cooldown_interrupts_long_sleep() {
        let registry = registry_with(&["a"]);
        let probe = Arc::new(ScriptedProbe::new());
        probe.set("a", true);

        let monitor = HealthMonitor::new(registry, probe.clone(), Duration::from_secs(3600));
        monitor.start().await;
        time::sleep(Duration::from_millis(30)).await;
        let sweeps_before = monitor.completed_sweeps();
        assert_eq!(sweeps_before, 1);

        let started = std::time::Instant::now();
        monitor.set_cooldown(Duration::from_millis(20)).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(monitor.cooldown(), Duration::from_millis(20));

        time::sleep(Duration::from_millis(100)).await;
        assert!(monitor.completed_sweeps() > sweeps_before + 1);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_sweep_tolerates_concurrent_removal() {
        let registry = registry_with(&["a", "b"]);
        let probe = Arc::new(ScriptedProbe::with_delay(Duration::from_millis(20)));
        probe.set("a", false);
        probe.set("b", false);

        let monitor = HealthMonitor::new(registry.clone(), probe, Duration::from_secs(60));
        monitor.start().await;
        // Remove "b" while the sweep is still probing "a".
        time::sleep(Duration::from_millis(5)).await;
        assert!(registry.remove_by_identity("b"));

        time::sleep(Duration::from_millis(80)).await;
        assert!(registry.is_empty());
        monitor.stop().await;
    }
}
