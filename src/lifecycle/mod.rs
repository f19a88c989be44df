//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Bind data port (fatal on failure)
//!     → Seed backends → Start health monitor → Admin server → Dispatcher
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → Stop accepting → Stop sweep
//!     → Drain workers → Exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
