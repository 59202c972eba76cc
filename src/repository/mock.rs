//! # Mock Repository
//!
//! Utilities for testing the withdrawal service without a running store.
//!
//! Queue expectations with [`MockRepository::expect_get_user`], hand the mock
//! to the code under test, then call [`MockRepository::verify`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::model::User;
use crate::repository::{RepositoryError, UserRepository};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected `get_user_by_id` call and its canned response.
struct Expectation {
    user_id: String,
    response: Result<User, RepositoryError>,
}

/// A repository double with expectation tracking.
///
/// Calls are matched in the order the expectations were queued; an
/// unexpected call or a call with the wrong id panics the test.
///
/// # Example
/// ```ignore
/// let mock = MockRepository::new();
/// mock.expect_get_user("user_1").return_ok(User::new("user_1", "alice"));
///
/// let service = WithdrawalService::new(Arc::new(mock.clone()), dispatcher);
/// // Use service in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
#[derive(Clone, Default)]
pub struct MockRepository {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl MockRepository {
    /// Creates a mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a `get_user_by_id` call for `user_id`.
    pub fn expect_get_user(&self, user_id: impl Into<String>) -> GetUserExpectationBuilder {
        GetUserExpectationBuilder {
            user_id: user_id.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.lock().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Expectation>> {
        // A poisoned lock means another assertion already failed; keep going.
        self.expectations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserRepository for MockRepository {
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, RepositoryError> {
        let expectation = self.lock().pop_front();
        match expectation {
            Some(Expectation {
                user_id: expected,
                response,
            }) => {
                assert_eq!(expected, user_id, "get_user_by_id called with unexpected id");
                response
            }
            None => panic!("Unexpected get_user_by_id({user_id:?})"),
        }
    }
}

/// Builder for `get_user_by_id` expectations.
pub struct GetUserExpectationBuilder {
    user_id: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl GetUserExpectationBuilder {
    /// Sets the expectation to return the given user.
    pub fn return_ok(self, user: User) {
        self.push(Ok(user));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: RepositoryError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<User, RepositoryError>) {
        let mut exps = self
            .expectations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        exps.push_back(Expectation {
            user_id: self.user_id,
            response,
        });
    }
}
