//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request id, tracing, CORS middleware)
//!     → request.rs (decode, bounded body read)
//!     → forwarder.rs (route, filter, send, relay)
//!     → response.rs (status, headers, body)
//!     → Send to client
//! ```

pub mod error;
pub mod forwarder;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use forwarder::Forwarder;
pub use request::{InboundRequest, MakeGatewayRequestId, X_REQUEST_ID};
pub use response::OutboundResponse;
pub use server::{AppState, BuildError, GatewayServer};
