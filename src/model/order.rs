use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Processing state of an uploaded order as tracked by the order subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Processing,
    Processed,
    Invalid,
}

/// An order number uploaded by a user.
///
/// The withdrawal fetcher only ever reads [`Order::id`]; the remaining fields
/// are carried so the type matches what the order subsystem stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "number")]
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub accrual: Decimal,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    /// Creates a freshly uploaded order (`NEW`, no accrual yet).
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            status: OrderStatus::New,
            accrual: Decimal::ZERO,
            uploaded_at: Utc::now(),
        }
    }
}
