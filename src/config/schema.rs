//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BalancerConfig {
    /// Data-port listener.
    pub listener: ListenerConfig,

    /// Dispatch loop and worker pool.
    pub dispatcher: DispatcherConfig,

    /// Backend connection settings.
    pub forward: ForwardConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Admin control surface.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Backends registered at startup (probe-gated like admin adds).
    pub backends: Vec<BackendConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
        }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Number of forwarding workers.
    pub worker_pool_size: usize,

    /// First sleep when no backend is available, in milliseconds.
    pub idle_backoff_base_ms: u64,

    /// Upper bound for that sleep, in milliseconds.
    pub idle_backoff_max_ms: u64,

    /// How long shutdown waits for open forwards before aborting them.
    pub shutdown_timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 4,
            idle_backoff_base_ms: 10,
            idle_backoff_max_ms: 500,
            shutdown_timeout_ms: 5000,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ForwardConfig {
    /// Backend connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3000,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Start the sweep at boot. When false, it starts on the first
    /// cooldown change from the admin surface.
    pub enabled: bool,

    /// Delay between sweeps in seconds.
    pub cooldown_secs: u64,

    /// Probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path to probe.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_secs: 5,
            timeout_ms: 2000,
            path: "/".to_string(),
        }
    }
}

/// Admin surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin routes.
    pub enabled: bool,

    /// Admin bind address.
    pub bind_address: String,

    /// Bearer token required on admin routes when set.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
            api_key: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A backend registered at startup.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BackendConfig {
    /// Backend identity, usually `host:port`.
    pub identity: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: BalancerConfig = toml::from_str("").unwrap();
        assert_eq!(config, BalancerConfig::default());
        assert_eq!(config.dispatcher.worker_pool_size, 4);
        assert_eq!(config.dispatcher.shutdown_timeout_ms, 5000);
        assert_eq!(config.health_check.cooldown_secs, 5);
        assert!(config.admin.api_key.is_none());
    }

    #[test]
    fn test_partial_document() {
        let config: BalancerConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [health_check]
            cooldown_secs = 30

            [admin]
            api_key = "secret"

            [[backends]]
            identity = "10.0.0.1:8000"

            [[backends]]
            identity = "10.0.0.2:8000"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.health_check.cooldown_secs, 30);
        assert_eq!(config.health_check.timeout_ms, 2000);
        assert_eq!(config.admin.api_key.as_deref(), Some("secret"));
        assert_eq!(config.admin.bind_address, "0.0.0.0:8080");
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[1].identity, "10.0.0.2:8000");
    }
}
