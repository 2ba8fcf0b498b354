//! Admission control for upstream calls.
//!
//! A semaphore caps how many upstream exchanges run at once. Callers wait
//! for a slot; the wait counts against the caller's own timeout budget.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

/// Bounds concurrent in-flight upstream calls.
#[derive(Debug, Clone)]
pub struct InFlightLimiter {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl InFlightLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<InFlightPermit, AcquireError> {
        let permit = self.slots.clone().acquire_owned().await?;
        metrics::upstream_in_flight(1.0);
        Ok(InFlightPermit { _permit: permit })
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A held in-flight slot.
#[derive(Debug)]
pub struct InFlightPermit {
    _permit: OwnedSemaphorePermit,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        metrics::upstream_in_flight(-1.0);
    }
}
