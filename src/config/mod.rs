//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated)
//!     → handed to each subsystem's constructor
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → ReloadPlan: cooldown applied live, other sections logged
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, BackendConfig, BalancerConfig, DispatcherConfig, ForwardConfig, HealthCheckConfig,
    ListenerConfig, ObservabilityConfig,
};
pub use validation::ValidationError;
pub use watcher::{ConfigWatcher, ReloadPlan};
