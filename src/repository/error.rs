//! Error types for the user repository.

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RepositoryError {
    /// The requested user was not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The user already uploaded this order number.
    #[error("order already uploaded: {0}")]
    OrderAlreadyUploaded(String),

    /// The order number belongs to a different user.
    #[error("order uploaded by another user: {0}")]
    OrderOwnedByOtherUser(String),

    /// The store actor is gone or dropped the reply.
    #[error("user store closed")]
    StoreClosed,
}

impl RepositoryError {
    pub fn is_user_not_found(&self) -> bool {
        matches!(self, RepositoryError::UserNotFound(_))
    }
}
