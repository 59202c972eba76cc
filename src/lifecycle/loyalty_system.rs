use std::sync::Arc;

use tracing::{error, info};

use crate::accrual::{AccrualClient, FetchError};
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::repository::{StoreClient, UserStore};
use crate::service::WithdrawalService;

const STORE_BUFFER: usize = 32;

/// The assembled runtime: user store actor plus withdrawal service.
pub struct LoyaltySystem {
    /// Client for registering users and uploading orders
    pub store: StoreClient,

    /// The withdrawal-history use case, backed by `store`
    pub withdrawals: WithdrawalService,

    /// Task handle of the store actor (used for graceful shutdown)
    handle: tokio::task::JoinHandle<()>,
}

impl LoyaltySystem {
    /// Starts the store actor and wires the service from `config`.
    ///
    /// Must be called inside a Tokio runtime. Fails only if the accrual
    /// client cannot be built from the configured address.
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        let client = Arc::new(AccrualClient::new(&config.accrual)?);
        let dispatcher = Dispatcher::from_settings(client, &config.dispatch);

        let (store_actor, store) = UserStore::new(STORE_BUFFER);
        let handle = tokio::spawn(store_actor.run());

        let withdrawals = WithdrawalService::new(Arc::new(store.clone()), dispatcher);
        info!(
            accrual = %config.accrual.address,
            query_limit = config.dispatch.query_limit,
            "Loyalty system started"
        );

        Ok(Self {
            store,
            withdrawals,
            handle,
        })
    }

    /// Shuts the system down.
    ///
    /// Dropping the store client and the service closes the store's channel;
    /// the actor then leaves its loop and the task completes. Clones of
    /// either handed out earlier keep the store alive until they are dropped.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down loyalty system...");

        drop(self.withdrawals);
        drop(self.store);

        if let Err(e) = self.handle.await {
            error!("User store task failed: {:?}", e);
            return Err(format!("User store task failed: {:?}", e));
        }

        info!("Shutdown complete.");
        Ok(())
    }
}
