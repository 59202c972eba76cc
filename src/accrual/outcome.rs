//! Interpretation of a single accrual response.
//!
//! Every attempt produces exactly one [`FetchOutcome`]; the retry loop in
//! [`AccrualClient`](super::AccrualClient) consumes it and decides whether to
//! stop or go around again.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};

use crate::accrual::FetchError;
use crate::model::Withdrawal;

/// Result of one request against the accrual service.
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    /// `200`: terminal success.
    Found(Withdrawal),
    /// `204`: terminal, the service has nothing for this order yet.
    NotFound,
    /// `429`: retry after the server-dictated delay.
    RateLimited { retry_after: Duration },
    /// Terminal failure for this order.
    Fatal(FetchError),
}

impl FetchOutcome {
    /// Maps a response onto an outcome, consuming the body when needed.
    pub(crate) async fn from_response(order_id: &str, response: Response) -> Self {
        match response.status() {
            StatusCode::OK => match response.bytes().await {
                Ok(body) => match decode_withdrawal(order_id, &body) {
                    Ok(withdrawal) => FetchOutcome::Found(withdrawal),
                    Err(e) => FetchOutcome::Fatal(e),
                },
                Err(source) => FetchOutcome::Fatal(FetchError::Transport {
                    order_id: order_id.to_string(),
                    source,
                }),
            },
            StatusCode::NO_CONTENT => FetchOutcome::NotFound,
            StatusCode::TOO_MANY_REQUESTS => match parse_retry_after(order_id, response.headers()) {
                Ok(retry_after) => FetchOutcome::RateLimited { retry_after },
                Err(e) => FetchOutcome::Fatal(e),
            },
            status => FetchOutcome::Fatal(FetchError::UnexpectedStatus {
                order_id: order_id.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

/// Reads `Retry-After` as a whole, non-negative number of seconds.
///
/// HTTP-date values are not accepted; the accrual service only sends seconds.
pub fn parse_retry_after(order_id: &str, headers: &HeaderMap) -> Result<Duration, FetchError> {
    let value = headers
        .get(RETRY_AFTER)
        .ok_or_else(|| FetchError::MissingRetryAfter {
            order_id: order_id.to_string(),
        })?;

    let invalid = || FetchError::InvalidRetryAfter {
        order_id: order_id.to_string(),
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };

    let text = value.to_str().map_err(|_| invalid())?;
    if text.is_empty() {
        return Err(FetchError::MissingRetryAfter {
            order_id: order_id.to_string(),
        });
    }

    text.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| invalid())
}

/// Decodes a `200` body into a [`Withdrawal`] for `order_id`.
///
/// Pure function: the same body always yields the same value.
pub fn decode_withdrawal(order_id: &str, body: &[u8]) -> Result<Withdrawal, FetchError> {
    let withdrawal: Withdrawal =
        serde_json::from_slice(body).map_err(|source| FetchError::Decode {
            order_id: order_id.to_string(),
            source,
        })?;

    if withdrawal.order != order_id {
        return Err(FetchError::OrderMismatch {
            requested: order_id.to_string(),
            received: withdrawal.order,
        });
    }

    Ok(withdrawal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use rust_decimal_macros::dec;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_retry_after_in_seconds() {
        let delay = parse_retry_after("42", &headers_with("60")).unwrap();
        assert_eq!(delay, Duration::from_secs(60));
    }

    #[test]
    fn test_retry_after_zero_is_valid() {
        let delay = parse_retry_after("42", &headers_with("0")).unwrap();
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_missing_retry_after_is_fatal() {
        let err = parse_retry_after("42", &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, FetchError::MissingRetryAfter { .. }));
    }

    #[test]
    fn test_non_numeric_retry_after_is_fatal() {
        for value in ["soon", "1.5", "-1", "Wed, 21 Oct 2015 07:28:00 GMT"] {
            let mut headers = HeaderMap::new();
            headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
            let err = parse_retry_after("42", &headers).unwrap_err();
            assert!(
                matches!(err, FetchError::InvalidRetryAfter { ref value, .. } if !value.is_empty()),
                "unexpected error for {value:?}: {err:?}"
            );
        }
    }

    #[test]
    fn test_decode_is_idempotent() {
        let body = br#"{"order":"79927398713","sum":729.98,"processed_at":"2021-02-01T10:00:00Z"}"#;

        let first = decode_withdrawal("79927398713", body).unwrap();
        let second = decode_withdrawal("79927398713", body).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.sum, dec!(729.98));
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        let err = decode_withdrawal("1", b"{\"order\":").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn test_decode_rejects_foreign_order() {
        let body = br#"{"order":"2","sum":1,"processed_at":"2021-02-01T10:00:00Z"}"#;
        let err = decode_withdrawal("1", body).unwrap_err();
        assert!(matches!(err, FetchError::OrderMismatch { ref received, .. } if received == "2"));
    }
}
