//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection
//!     → dispatcher.rs (accept loop)
//!     → round_robin.rs (cursor mod len over a registry snapshot,
//!                       probe, evict unhealthy, retry)
//!     → pool.rs (bounded workers run the forward)
//!
//! registry.rs is shared with the health monitor and the admin surface.
//! ```
//!
//! # Design Decisions
//! - The registry is the only shared mutable structure
//! - Eviction from every component goes through the same removal call
//! - No lock is held while probing

pub mod backend;
pub mod dispatcher;
pub mod pool;
pub mod registry;
pub mod round_robin;

pub use backend::{Backend, BackendError};
pub use dispatcher::Dispatcher;
pub use pool::WorkerPool;
pub use registry::{Registry, RegistryError};
pub use round_robin::RoundRobin;
