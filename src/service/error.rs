//! Error types for the withdrawal service.

use thiserror::Error;

use crate::dispatch::BatchError;
use crate::repository::RepositoryError;

/// Errors returned to callers of [`WithdrawalService`](super::WithdrawalService).
#[derive(Debug, Error)]
pub enum WithdrawalError {
    /// Loading the user failed; passed through unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// At least one order could not be fetched. The per-order detail is only
    /// reachable through [`std::error::Error::source`].
    #[error("failed to get withdrawals")]
    FailedToGetWithdrawals(#[source] BatchError),
}

impl WithdrawalError {
    pub fn is_user_not_found(&self) -> bool {
        matches!(self, WithdrawalError::Repository(e) if e.is_user_not_found())
    }

    /// The underlying batch failure, for diagnostics.
    pub fn batch(&self) -> Option<&BatchError> {
        match self {
            WithdrawalError::FailedToGetWithdrawals(batch) => Some(batch),
            WithdrawalError::Repository(_) => None,
        }
    }
}
