//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → tls.rs (optional TLS handshake; failures drop the connection)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Each connection is served by its own task; none share mutable state
//! - TLS is optional and handled transparently

pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::{load_tls_config, serve_tls, TlsError};
