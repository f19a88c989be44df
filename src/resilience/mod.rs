//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher finds no usable backend:
//!     → backoff.rs (bounded, jittered sleep)
//!     → woken early when the registry gains a backend
//! ```
//!
//! # Design Decisions
//! - Waiting is never a busy loop; every retry sleeps
//! - The cap keeps the wake-up latency small once backends come back

pub mod backoff;
