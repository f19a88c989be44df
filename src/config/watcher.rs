//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Watcher, RecursiveMode, Event, RecommendedWatcher, Config};
use tokio::sync::mpsc;
use crate::config::loader::load_config;
use crate::config::schema::BalancerConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<BalancerConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    /// 
    /// Returns the watcher and a receiver for validated configurations.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<BalancerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        
        (Self {
            path: path.to_path_buf(),
            update_tx,
        }, update_rx)
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Config file change detected, reloading");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        
        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// What a reloaded configuration means for the running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadPlan {
    /// New sweep cooldown, when it changed.
    pub cooldown_secs: Option<u64>,
    /// Sections that changed but only take effect after a restart.
    pub restart_required: Vec<&'static str>,
}

impl ReloadPlan {
    /// Compare the running configuration with a reloaded one.
    pub fn diff(current: &BalancerConfig, next: &BalancerConfig) -> Self {
        let cooldown_secs = (current.health_check.cooldown_secs != next.health_check.cooldown_secs)
            .then_some(next.health_check.cooldown_secs);

        let mut restart_required = Vec::new();
        if current.listener != next.listener {
            restart_required.push("listener");
        }
        if current.dispatcher != next.dispatcher {
            restart_required.push("dispatcher");
        }
        if current.forward != next.forward {
            restart_required.push("forward");
        }
        if current.health_check.timeout_ms != next.health_check.timeout_ms
            || current.health_check.path != next.health_check.path
            || current.health_check.enabled != next.health_check.enabled
        {
            restart_required.push("health_check");
        }
        if current.admin != next.admin {
            restart_required.push("admin");
        }
        if current.observability != next.observability {
            restart_required.push("observability");
        }
        if current.backends != next.backends {
            // Runtime membership is owned by the admin surface.
            restart_required.push("backends");
        }

        Self {
            cooldown_secs,
            restart_required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendConfig;

    #[test]
    fn test_diff_unchanged() {
        let config = BalancerConfig::default();
        let plan = ReloadPlan::diff(&config, &config.clone());
        assert_eq!(plan.cooldown_secs, None);
        assert!(plan.restart_required.is_empty());
    }

    #[test]
    fn test_diff_cooldown_and_restart_sections() {
        let current = BalancerConfig::default();
        let mut next = current.clone();
        next.health_check.cooldown_secs = 42;
        next.dispatcher.worker_pool_size = 16;
        next.backends.push(BackendConfig { identity: "10.0.0.3:80".into() });

        let plan = ReloadPlan::diff(&current, &next);
        assert_eq!(plan.cooldown_secs, Some(42));
        assert_eq!(plan.restart_required, vec!["dispatcher", "backends"]);
    }
}
