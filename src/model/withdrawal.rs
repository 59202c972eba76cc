use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Points withdrawn against a single order, as reported by the accrual service.
///
/// Values are only ever produced by [`crate::accrual`] from a successful
/// accrual response and are never mutated afterwards.
///
/// `sum` is accepted either as a JSON number or a string and is always
/// written back as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Withdrawal {
    pub order: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl Withdrawal {
    pub fn new(order: impl Into<String>, sum: Decimal, processed_at: DateTime<Utc>) -> Self {
        Self {
            order: order.into(),
            sum,
            processed_at,
        }
    }
}
