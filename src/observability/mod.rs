//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, dispatcher, health monitor, forwarder produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
