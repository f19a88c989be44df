//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Probe (probe.rs):
//!     GET <endpoint><path> with timeout → healthy / unhealthy
//!
//! Active sweep (active.rs):
//!     Snapshot registry
//!     → Probe each backend
//!     → Evict failures from the registry
//!     → Sleep cooldown, repeat
//!
//! Reconfiguration:
//!     set_cooldown → stop old task → await exit → spawn new task
//! ```
//!
//! # Design Decisions
//! - Unhealthy means removed; there is no "marked unhealthy" state that
//!   dispatch would have to filter
//! - Probes never run under a registry lock

pub mod active;
pub mod probe;

pub use active::{HealthError, HealthMonitor};
pub use probe::{HttpProbe, Probe};
