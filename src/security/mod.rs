//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (bounded body read)
//!     → headers.rs (strip hop-by-hop, Host)
//!     → Pass to upstream client
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → cors.rs (fixed CORS allow-list)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject oversized or badly framed bodies before forwarding
//! - No trust in client framing headers

pub mod cors;
pub mod headers;
pub mod limits;

pub use cors::{CorsError, CorsPolicy};
pub use headers::{filter_inbound, filter_outbound};
pub use limits::{read_body, BodyError};
