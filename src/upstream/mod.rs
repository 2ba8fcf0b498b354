//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     UpstreamConfig[] → target.rs (parse base URLs) → UpstreamTable
//!
//! Per request:
//!     upstream id + rewritten path + filtered headers
//!     → target.rs (pick base URL, join path)
//!     → client.rs (admission, send, read body, all under one deadline)
//!     → RawResponse or TransportError
//! ```

pub mod client;
pub mod target;

pub use client::{RawResponse, TransportError, UpstreamClient, UpstreamRequest};
pub use target::{UpstreamError, UpstreamTable, UpstreamTarget};
