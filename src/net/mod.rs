//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection ID)
//!     → connection.rs (Accepted: stream + peer + ID)
//!     → [dispatcher picks a backend]
//!     → forward.rs (connect backend, relay bytes both ways)
//! ```
//!
//! # Design Decisions
//! - The data port carries raw byte streams; no protocol is assumed
//! - Forward failures are logged and counted, never fed back to the registry

pub mod connection;
pub mod forward;
pub mod listener;

pub use connection::{Accepted, ConnectionId};
pub use forward::{Forward, ForwardError, ForwardStats, TcpForwarder};
pub use listener::{bind_tcp, Listener, ListenerError};
