//! Per-order client for the external accrual service.
//!
//! [`AccrualClient`] issues `GET {base}/api/orders/{id}` and runs the retry
//! loop for one order:
//!
//! ```text
//! Attempting ──200──▶ Found (terminal)
//!     │      ──204──▶ NotFound (terminal)
//!     │      ──429──▶ sleep Retry-After ──▶ Attempting   (while attempts remain)
//!     └──── other ──▶ Fatal (terminal)
//! ```
//!
//! The caller decides how many requests may be in flight by handing in a
//! [`Semaphore`]; a permit is held only while a request and its body are
//! outstanding, never during the backoff sleep.

pub mod error;
pub mod outcome;

pub use error::*;
pub use outcome::{decode_withdrawal, parse_retry_after};

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::AccrualSettings;
use crate::model::Withdrawal;
use outcome::FetchOutcome;

/// HTTP client for the accrual service.
///
/// Cheap to share behind an `Arc`; the inner `reqwest::Client` pools
/// connections across every worker of a batch.
#[derive(Debug, Clone)]
pub struct AccrualClient {
    http: reqwest::Client,
    base_url: Url,
    max_attempts: u32,
}

impl AccrualClient {
    /// Builds a client from the accrual settings.
    ///
    /// The address may be given as `host:port`; `http://` is assumed then.
    pub fn new(settings: &AccrualSettings) -> Result<Self, FetchError> {
        let base_url = base_url(&settings.address)?;
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .pool_max_idle_per_host(settings.max_idle_connections)
            .pool_idle_timeout(settings.idle_timeout())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            base_url,
            max_attempts: settings.max_attempts.max(1),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetches the withdrawal for a single order, outside of any batch.
    ///
    /// Returns `Ok(None)` when the service has no accrual record for the order.
    pub async fn fetch(&self, order_id: &str) -> Result<Option<Withdrawal>, FetchError> {
        let permits = Semaphore::new(1);
        self.fetch_gated(order_id, &permits, &CancellationToken::new())
            .await
    }

    /// Fetches one order, taking a permit from `permits` for every request
    /// and giving up as soon as `cancel` fires.
    #[instrument(skip(self, permits, cancel))]
    pub async fn fetch_gated(
        &self,
        order_id: &str,
        permits: &Semaphore,
        cancel: &CancellationToken,
    ) -> Result<Option<Withdrawal>, FetchError> {
        let url = self.order_url(order_id)?;
        let cancelled = || FetchError::Cancelled {
            order_id: order_id.to_string(),
        };

        let mut attempts = 0;
        while attempts < self.max_attempts {
            attempts += 1;
            debug!(attempt = attempts, "Requesting accrual");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                outcome = self.attempt(order_id, &url, permits) => outcome,
            };

            match outcome {
                FetchOutcome::Found(withdrawal) => {
                    debug!(attempt = attempts, sum = %withdrawal.sum, "Found");
                    return Ok(Some(withdrawal));
                }
                FetchOutcome::NotFound => {
                    debug!(attempt = attempts, "No accrual yet");
                    return Ok(None);
                }
                FetchOutcome::Fatal(e) => {
                    warn!(attempt = attempts, error = %e, "Fetch failed");
                    return Err(e);
                }
                FetchOutcome::RateLimited { retry_after } => {
                    if attempts >= self.max_attempts {
                        break;
                    }
                    warn!(
                        attempt = attempts,
                        retry_after_secs = retry_after.as_secs(),
                        "Rate limited, backing off"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(cancelled()),
                        _ = tokio::time::sleep(retry_after) => {}
                    }
                }
            }
        }

        warn!(attempts, "Giving up, still rate limited");
        Err(FetchError::RetryExhausted {
            order_id: order_id.to_string(),
            attempts,
        })
    }

    /// One request/response cycle. The permit is released when this returns.
    async fn attempt(&self, order_id: &str, url: &Url, permits: &Semaphore) -> FetchOutcome {
        let _permit = match permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return FetchOutcome::Fatal(FetchError::Cancelled {
                    order_id: order_id.to_string(),
                })
            }
        };

        let response = self
            .http
            .get(url.clone())
            .header(CONTENT_TYPE, "text/plain")
            .send()
            .await;

        match response {
            Ok(response) => FetchOutcome::from_response(order_id, response).await,
            Err(source) => FetchOutcome::Fatal(FetchError::Transport {
                order_id: order_id.to_string(),
                source,
            }),
        }
    }

    fn order_url(&self, order_id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl {
                address: self.base_url.to_string(),
                reason: "address cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["api", "orders", order_id]);
        Ok(url)
    }
}

fn base_url(address: &str) -> Result<Url, FetchError> {
    let address = address.trim();
    let with_scheme = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };

    Url::parse(&with_scheme).map_err(|e| FetchError::InvalidBaseUrl {
        address: address.to_string(),
        reason: e.to_string(),
    })
}
