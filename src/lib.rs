//! TCP round-robin load balancer library.

pub mod admin;
pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod server;

pub use config::BalancerConfig;
pub use error::BalancerError;
pub use lifecycle::Shutdown;
pub use server::BalancerServer;
