//! The withdrawal-history use case: load a user, fetch every order's
//! withdrawal from the accrual service, return the ones that exist.

pub mod error;

pub use error::*;

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::dispatch::Dispatcher;
use crate::model::Withdrawal;
use crate::repository::UserRepository;

/// Orchestrates the repository and the dispatcher.
#[derive(Clone)]
pub struct WithdrawalService {
    repo: Arc<dyn UserRepository>,
    dispatcher: Dispatcher,
}

impl WithdrawalService {
    pub fn new(repo: Arc<dyn UserRepository>, dispatcher: Dispatcher) -> Self {
        Self { repo, dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the withdrawals recorded for every order of `user_id`.
    ///
    /// The result is in no particular order. Repository errors, including
    /// "user not found", are returned as they are; any per-order failure
    /// turns into a single [`WithdrawalError::FailedToGetWithdrawals`].
    #[instrument(skip(self))]
    pub async fn get_user_withdrawals(
        &self,
        user_id: &str,
    ) -> Result<Vec<Withdrawal>, WithdrawalError> {
        let user = self.repo.get_user_by_id(user_id).await?;
        info!(orders = user.orders.len(), "Fetching withdrawals");

        self.dispatcher
            .fetch_all(&user.orders)
            .await
            .map_err(|e| {
                if let Some(first) = e.first_failure() {
                    error!(order_id = %first.order_id, kind = ?first.error.kind(), error = %e, "Failed to get withdrawals");
                } else {
                    error!(error = %e, "Failed to get withdrawals");
                }
                WithdrawalError::FailedToGetWithdrawals(e)
            })
    }
}
