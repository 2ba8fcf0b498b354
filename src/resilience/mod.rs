//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (one deadline for the whole exchange)
//!     → admission.rs (wait for an in-flight slot)
//!     → upstream call
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: one client request triggers at most one upstream attempt,
//!   so non-idempotent calls are never duplicated
//! - A bounded in-flight count keeps slow upstreams from exhausting the proxy

pub mod admission;
pub mod timeouts;

pub use admission::{InFlightLimiter, InFlightPermit};
pub use timeouts::within_budget;
