//! Bounded fan-out of per-order fetches.
//!
//! # Architecture Note
//! [`Dispatcher::fetch_all`] spawns one task per distinct order into a
//! [`JoinSet`]. Workers never touch shared results: each one sends its
//! outcome over a channel and the dispatcher, the single writer, merges them.
//! There is no lock to misuse.
//!
//! Concurrency is bounded by a [`RequestLimit`] created per call, so one batch
//! never has more than `query_limit` requests in flight. Workers sleeping on
//! `Retry-After` hold no permit.
//!
//! Dropping the `fetch_all` future aborts every worker of the batch, which is
//! how a caller imposes an overall deadline (`tokio::time::timeout`).

pub mod error;
pub mod limit;

pub use error::*;
pub use limit::*;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::accrual::{AccrualClient, FetchError};
use crate::config::{DispatchSettings, FailurePolicy};
use crate::model::{Order, Withdrawal};

type WorkerReport = (String, Result<Option<Withdrawal>, FetchError>);

/// Fetches withdrawals for a set of orders with bounded parallelism.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Arc<AccrualClient>,
    query_limit: usize,
    policy: FailurePolicy,
}

impl Dispatcher {
    pub fn new(client: Arc<AccrualClient>, query_limit: usize, policy: FailurePolicy) -> Self {
        Self {
            client,
            query_limit: query_limit.max(1),
            policy,
        }
    }

    pub fn from_settings(client: Arc<AccrualClient>, settings: &DispatchSettings) -> Self {
        Self::new(client, settings.query_limit, settings.on_failure)
    }

    pub fn query_limit(&self) -> usize {
        self.query_limit
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Fetches every order and returns the withdrawals that exist.
    ///
    /// Orders without an accrual record are skipped. If any order fails the
    /// whole call fails and nothing that was already merged is returned.
    pub async fn fetch_all(&self, orders: &[Order]) -> Result<Vec<Withdrawal>, BatchError> {
        self.fetch_all_with(orders, &CancellationToken::new()).await
    }

    /// Like [`fetch_all`](Self::fetch_all), but stops early once `cancel` fires.
    #[instrument(skip_all, fields(orders = orders.len(), query_limit = self.query_limit))]
    pub async fn fetch_all_with(
        &self,
        orders: &[Order],
        cancel: &CancellationToken,
    ) -> Result<Vec<Withdrawal>, BatchError> {
        let batch = cancel.child_token();
        let limit = RequestLimit::new(self.query_limit);
        let (reports, mut inbox) = mpsc::unbounded_channel::<WorkerReport>();

        // =====================================================================
        // Fan-out: one worker per distinct order
        // =====================================================================

        let mut pending = HashSet::with_capacity(orders.len());
        let mut workers = JoinSet::new();
        for order in orders {
            if !pending.insert(order.id.clone()) {
                debug!(order_id = %order.id, "Skipping duplicate order");
                continue;
            }

            let client = Arc::clone(&self.client);
            let limit = limit.clone();
            let token = batch.clone();
            let reports = reports.clone();
            let order_id = order.id.clone();
            workers.spawn(async move {
                let result = client
                    .fetch_gated(&order_id, limit.semaphore(), &token)
                    .await;
                let _ = reports.send((order_id, result));
            });
        }
        drop(reports);

        // =====================================================================
        // Fan-in: this loop is the only writer of the result set
        // =====================================================================

        let mut withdrawals = Vec::with_capacity(pending.len());
        let mut failures = Vec::new();
        let mut cancelled = 0usize;
        while let Some((order_id, result)) = inbox.recv().await {
            pending.remove(&order_id);
            match result {
                Ok(Some(withdrawal)) => withdrawals.push(withdrawal),
                Ok(None) => {}
                Err(e) if e.is_cancelled() => {
                    debug!(%order_id, "Worker cancelled");
                    cancelled += 1;
                }
                Err(error) => {
                    warn!(%order_id, error = %error, "Order failed");
                    failures.push(OrderFailure { order_id, error });
                    if self.policy == FailurePolicy::Cancel && !batch.is_cancelled() {
                        info!("Cancelling remaining workers");
                        batch.cancel();
                    }
                }
            }
        }

        // Every sender is gone, so the workers have finished or died.
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Worker task failed");
            }
        }
        for order_id in pending {
            failures.push(OrderFailure {
                order_id: order_id.clone(),
                error: FetchError::Worker {
                    order_id,
                    reason: "worker exited without reporting".to_string(),
                },
            });
        }

        if !failures.is_empty() {
            warn!(failed = failures.len(), "Batch failed, discarding results");
            return Err(BatchError::Failed { failures });
        }
        if cancelled > 0 {
            info!(cancelled, "Batch cancelled by caller");
            return Err(BatchError::Cancelled);
        }

        info!(found = withdrawals.len(), "Batch complete");
        Ok(withdrawals)
    }
}
