//! Error types for batch fetching.

use thiserror::Error;

use crate::accrual::FetchError;

/// One order that could not be fetched.
#[derive(Debug, Error)]
#[error("order {order_id}: {error}")]
pub struct OrderFailure {
    pub order_id: String,
    #[source]
    pub error: FetchError,
}

/// Errors that end a whole batch.
///
/// No partial results accompany either variant.
#[derive(Debug, Error)]
pub enum BatchError {
    /// At least one order failed. `failures` is never empty; its first entry
    /// is the first failure the dispatcher observed.
    #[error("{} of the batch's orders failed", .failures.len())]
    Failed { failures: Vec<OrderFailure> },

    /// The caller cancelled the batch before it completed.
    #[error("batch cancelled before completion")]
    Cancelled,
}

impl BatchError {
    /// Every per-order failure that was recorded.
    pub fn failures(&self) -> &[OrderFailure] {
        match self {
            BatchError::Failed { failures } => failures,
            BatchError::Cancelled => &[],
        }
    }

    pub fn first_failure(&self) -> Option<&OrderFailure> {
        self.failures().first()
    }
}
