//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool size > 0)
//! - Check addresses parse and seed backends are unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::BalancerConfig;
use crate::health::active::MAX_COOLDOWN_SECS;
use crate::load_balancer::backend::Backend;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("health_check.cooldown_secs must not exceed {}", MAX_COOLDOWN_SECS)]
    CooldownRange,
    #[error("dispatcher.idle_backoff_base_ms must not exceed idle_backoff_max_ms")]
    BackoffRange,
    #[error("backends: invalid identity {0:?}")]
    InvalidBackend(String),
    #[error("backends: duplicate identity {0:?}")]
    DuplicateBackend(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.dispatcher.worker_pool_size == 0 {
        errors.push(ValidationError::Zero("dispatcher.worker_pool_size"));
    }
    if config.dispatcher.idle_backoff_base_ms == 0 {
        errors.push(ValidationError::Zero("dispatcher.idle_backoff_base_ms"));
    }
    if config.dispatcher.idle_backoff_base_ms > config.dispatcher.idle_backoff_max_ms {
        errors.push(ValidationError::BackoffRange);
    }
    if config.forward.connect_timeout_ms == 0 {
        errors.push(ValidationError::Zero("forward.connect_timeout_ms"));
    }
    if config.health_check.cooldown_secs == 0 {
        errors.push(ValidationError::Zero("health_check.cooldown_secs"));
    } else if config.health_check.cooldown_secs > MAX_COOLDOWN_SECS {
        errors.push(ValidationError::CooldownRange);
    }
    if config.health_check.timeout_ms == 0 {
        errors.push(ValidationError::Zero("health_check.timeout_ms"));
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        if Backend::new(backend.identity.as_str()).is_err() {
            errors.push(ValidationError::InvalidBackend(backend.identity.clone()));
        } else if !seen.insert(backend.identity.trim()) {
            errors.push(ValidationError::DuplicateBackend(backend.identity.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BalancerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = BalancerConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.dispatcher.worker_pool_size = 0;
        config.health_check.cooldown_secs = 0;
        config.backends = vec![
            BackendConfig { identity: "10.0.0.1:80".into() },
            BackendConfig { identity: "10.0.0.1:80".into() },
            BackendConfig { identity: " ".into() },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "listener.bind_address",
                    value: "nowhere".into(),
                },
                ValidationError::Zero("dispatcher.worker_pool_size"),
                ValidationError::Zero("health_check.cooldown_secs"),
                ValidationError::DuplicateBackend("10.0.0.1:80".into()),
                ValidationError::InvalidBackend(" ".into()),
            ]
        );
    }

    #[test]
    fn test_disabled_admin_address_not_checked() {
        let mut config = BalancerConfig::default();
        config.admin.enabled = false;
        config.admin.bind_address = "garbage".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_backoff_range() {
        let mut config = BalancerConfig::default();
        config.dispatcher.idle_backoff_base_ms = 1000;
        config.dispatcher.idle_backoff_max_ms = 10;
        assert_eq!(validate_config(&config), Err(vec![ValidationError::BackoffRange]));
    }

    #[test]
    fn test_cooldown_upper_bound() {
        let mut config = BalancerConfig::default();
        config.health_check.cooldown_secs = u64::MAX;
        assert_eq!(validate_config(&config), Err(vec![ValidationError::CooldownRange]));

        config.health_check.cooldown_secs = MAX_COOLDOWN_SECS;
        assert!(validate_config(&config).is_ok());
    }
}
