//! # In-memory user store
//!
//! An actor that owns every user and order. Requests arrive over an `mpsc`
//! channel and are answered through `oneshot` channels, one at a time.
//!
//! # Architecture Note
//! Because the actor processes its messages sequentially inside one task,
//! `users` and `owners` need no `Mutex`: exclusive ownership of the maps by
//! the task is what keeps them consistent.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::model::{Order, User};
use crate::repository::{RepositoryError, UserRepository};

type Reply<T> = oneshot::Sender<Result<T, RepositoryError>>;

/// Messages understood by the [`UserStore`] actor.
#[derive(Debug)]
pub enum StoreRequest {
    Register {
        login: String,
        respond_to: Reply<String>,
    },
    UploadOrder {
        user_id: String,
        order_id: String,
        respond_to: Reply<Order>,
    },
    GetUser {
        user_id: String,
        respond_to: Reply<User>,
    },
}

/// The server half of the store.
pub struct UserStore {
    receiver: mpsc::Receiver<StoreRequest>,
    users: HashMap<String, User>,
    /// order number -> owning user id
    owners: HashMap<String, String>,
    next_id: u64,
}

impl UserStore {
    /// Creates the actor and a client for it.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Capacity of the request channel; senders wait when it is full.
    ///
    /// The actor does nothing until [`run`](Self::run) is spawned.
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let store = Self {
            receiver,
            users: HashMap::new(),
            owners: HashMap::new(),
            next_id: 1,
        };
        (store, StoreClient { sender })
    }

    /// Processes requests until every client has been dropped.
    pub async fn run(mut self) {
        info!("User store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Register { login, respond_to } => {
                    let user_id = format!("user_{}", self.next_id);
                    self.next_id += 1;
                    self.users
                        .insert(user_id.clone(), User::new(user_id.clone(), login));
                    info!(%user_id, size = self.users.len(), "Registered");
                    let _ = respond_to.send(Ok(user_id));
                }
                StoreRequest::UploadOrder {
                    user_id,
                    order_id,
                    respond_to,
                } => {
                    let result = self.upload_order(&user_id, order_id);
                    if let Err(e) = &result {
                        warn!(%user_id, error = %e, "Upload rejected");
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::GetUser {
                    user_id,
                    respond_to,
                } => {
                    let user = self.users.get(&user_id).cloned();
                    debug!(%user_id, found = user.is_some(), "Get");
                    let _ = respond_to.send(user.ok_or(RepositoryError::UserNotFound(user_id)));
                }
            }
        }

        info!(size = self.users.len(), "User store shut down");
    }

    fn upload_order(&mut self, user_id: &str, order_id: String) -> Result<Order, RepositoryError> {
        if let Some(owner) = self.owners.get(&order_id) {
            return Err(if owner == user_id {
                RepositoryError::OrderAlreadyUploaded(order_id)
            } else {
                RepositoryError::OrderOwnedByOtherUser(order_id)
            });
        }

        let user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| RepositoryError::UserNotFound(user_id.to_string()))?;

        let order = Order::new(order_id.clone(), user_id);
        user.orders.push(order.clone());
        self.owners.insert(order_id.clone(), user_id.to_string());
        info!(%user_id, %order_id, "Order uploaded");
        Ok(order)
    }
}

/// Cloneable handle to a running [`UserStore`].
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> StoreRequest,
    ) -> Result<T, RepositoryError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| RepositoryError::StoreClosed)?;
        response.await.map_err(|_| RepositoryError::StoreClosed)?
    }

    /// Registers a user and returns the new id.
    #[instrument(skip(self))]
    pub async fn register_user(&self, login: &str) -> Result<String, RepositoryError> {
        let login = login.to_string();
        self.request(|respond_to| StoreRequest::Register { login, respond_to })
            .await
    }

    /// Attaches an order number to a user; the order starts out as `NEW`.
    #[instrument(skip(self))]
    pub async fn upload_order(&self, user_id: &str, order_id: &str) -> Result<Order, RepositoryError> {
        let user_id = user_id.to_string();
        let order_id = order_id.to_string();
        self.request(|respond_to| StoreRequest::UploadOrder {
            user_id,
            order_id,
            respond_to,
        })
        .await
    }
}

#[async_trait]
impl UserRepository for StoreClient {
    #[instrument(skip(self))]
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, RepositoryError> {
        let user_id = user_id.to_string();
        self.request(|respond_to| StoreRequest::GetUser {
            user_id,
            respond_to,
        })
        .await
    }
}
