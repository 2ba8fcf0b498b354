//! CORS gateway.
//!
//! A reverse proxy that sits between a browser client and the HTTP services
//! it cannot call directly. Requests are classified by path prefix, forwarded
//! to one upstream, and relayed back with a fixed CORS header set, optionally
//! behind TLS.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (listener, TLS) ─▶ http (request id, CORS, decode)
//!                                                 │
//!                                                 ▼
//!                          routing (longest prefix) ─▶ upstream (table, client)
//!                                                 │
//!     Client Response                             ▼
//!     ◀────────────── http (relay, CORS) ◀─ security (header filter)
//!
//!     Cross-cutting: config, resilience (timeouts, in-flight cap),
//!                    observability, lifecycle
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod marketplace;
pub mod net;
pub mod routing;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
