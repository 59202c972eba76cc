//! Storage collaborator for the withdrawal service.
//!
//! The service only needs [`UserRepository::get_user_by_id`]. Two
//! implementations ship with the crate:
//!
//! - [`StoreClient`], the handle to an in-memory [`UserStore`] actor
//! - [`MockRepository`], an expectation-driven double for tests

pub mod error;
pub mod mock;
pub mod store;

pub use error::*;
pub use mock::MockRepository;
pub use store::{StoreClient, UserStore};

use async_trait::async_trait;

use crate::model::User;

/// Read access to users and their uploaded orders.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Loads a user with all of their orders.
    ///
    /// Fails with [`RepositoryError::UserNotFound`] when no such user exists.
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, RepositoryError>;
}
