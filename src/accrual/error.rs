//! Error types for the accrual client.

use thiserror::Error;

/// Coarse classification of a per-order failure, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The accrual service answered in a way the protocol does not allow.
    ProtocolViolation,
    /// The request never produced a usable response (network, timeout, body read).
    TransportFailure,
    /// Still rate limited after the last permitted attempt.
    RetryExhausted,
    /// The fetch was abandoned because its batch was cancelled.
    Cancelled,
    /// The client could not be built or the worker died.
    Setup,
}

/// Errors that can occur while fetching accrual information for one order.
///
/// "Not found" (`204`) is not an error and never appears here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured accrual address cannot be turned into a base URL.
    #[error("invalid accrual address {address:?}: {reason}")]
    InvalidBaseUrl { address: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build accrual http client")]
    Client(#[source] reqwest::Error),

    /// Sending the request or reading the body failed.
    #[error("request for order {order_id} failed")]
    Transport {
        order_id: String,
        #[source]
        source: reqwest::Error,
    },

    /// A `429` arrived without a `Retry-After` header.
    #[error("order {order_id}: rate limited without Retry-After")]
    MissingRetryAfter { order_id: String },

    /// A `429` arrived with a `Retry-After` that is not a whole number of seconds.
    #[error("order {order_id}: invalid Retry-After value {value:?}")]
    InvalidRetryAfter { order_id: String, value: String },

    /// The `200` body is not a valid withdrawal record.
    #[error("order {order_id}: failed to decode accrual response")]
    Decode {
        order_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The `200` body describes a different order than the one requested.
    #[error("requested order {requested} but accrual service answered for {received}")]
    OrderMismatch { requested: String, received: String },

    /// Any status other than `200`, `204` or `429`.
    #[error("order {order_id}: unexpected status {status}")]
    UnexpectedStatus { order_id: String, status: u16 },

    /// Every attempt was answered with `429`.
    #[error("failed to fetch order {order_id}: still rate limited after {attempts} attempts")]
    RetryExhausted { order_id: String, attempts: u32 },

    /// The batch this fetch belonged to was cancelled.
    #[error("fetch of order {order_id} cancelled")]
    Cancelled { order_id: String },

    /// The worker task panicked or was aborted.
    #[error("worker for order {order_id} failed: {reason}")]
    Worker { order_id: String, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::MissingRetryAfter { .. }
            | FetchError::InvalidRetryAfter { .. }
            | FetchError::Decode { .. }
            | FetchError::OrderMismatch { .. }
            | FetchError::UnexpectedStatus { .. } => FailureKind::ProtocolViolation,
            FetchError::Transport { .. } => FailureKind::TransportFailure,
            FetchError::RetryExhausted { .. } => FailureKind::RetryExhausted,
            FetchError::Cancelled { .. } => FailureKind::Cancelled,
            FetchError::InvalidBaseUrl { .. } | FetchError::Client(_) | FetchError::Worker { .. } => {
                FailureKind::Setup
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_violations_are_classified_together() {
        let missing = FetchError::MissingRetryAfter { order_id: "1".into() };
        let invalid = FetchError::InvalidRetryAfter {
            order_id: "1".into(),
            value: "soon".into(),
        };
        let status = FetchError::UnexpectedStatus {
            order_id: "1".into(),
            status: 500,
        };

        assert_eq!(missing.kind(), FailureKind::ProtocolViolation);
        assert_eq!(invalid.kind(), FailureKind::ProtocolViolation);
        assert_eq!(status.kind(), FailureKind::ProtocolViolation);
    }

    #[test]
    fn test_exhausted_and_cancelled_kinds() {
        let exhausted = FetchError::RetryExhausted {
            order_id: "1".into(),
            attempts: 5,
        };
        let cancelled = FetchError::Cancelled { order_id: "1".into() };

        assert_eq!(exhausted.kind(), FailureKind::RetryExhausted);
        assert!(cancelled.is_cancelled());
        assert!(!exhausted.is_cancelled());
        assert_eq!(
            exhausted.to_string(),
            "failed to fetch order 1: still rate limited after 5 attempts"
        );
    }
}
