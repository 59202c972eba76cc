use serde::{Deserialize, Serialize};

use crate::model::Order;

/// A registered loyalty-program member together with the orders they uploaded.
///
/// Only the fields the withdrawal fetcher needs are modelled here; credentials
/// and balances belong to other subsystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl User {
    /// Creates a user with no orders.
    ///
    /// # Arguments
    /// * `id` - Identifier assigned by the store
    /// * `login` - Login the user registered with
    pub fn new(id: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            login: login.into(),
            orders: Vec::new(),
        }
    }

    /// Builder-style helper that attaches orders, mostly useful in tests.
    pub fn with_orders(mut self, orders: Vec<Order>) -> Self {
        self.orders = orders;
        self
    }

    /// Identifiers of every uploaded order.
    pub fn order_ids(&self) -> impl Iterator<Item = &str> {
        self.orders.iter().map(|order| order.id.as_str())
    }
}
