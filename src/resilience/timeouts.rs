//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the wait for a response head, and each wait for a body chunk
//! - Cancel the exchange cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future cancels the call
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::upstream::TransportError;

/// Run `exchange` within `budget`, mapping expiry to `TransportError::Timeout`.
pub async fn within_budget<T, F>(budget: Duration, exchange: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(budget, exchange).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(budget)),
    }
}
