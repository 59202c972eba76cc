#![allow(dead_code)]
//! A scripted accrual service for integration tests.
//!
//! Each order number gets a queue of replies; the last reply of a queue is
//! repeated once the queue is down to one entry. Orders without a script are
//! answered with `204`.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use loyalty_withdrawals::accrual::AccrualClient;
use loyalty_withdrawals::config::{AccrualSettings, AppConfig, FailurePolicy};

pub const PROCESSED_AT: &str = "2020-12-09T16:09:57+03:00";

/// A canned accrual response.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `200` with a withdrawal for the requested order.
    Ok { sum: f64 },
    /// `204`
    NoContent,
    /// `429`, optionally with a `Retry-After` value.
    TooMany(Option<&'static str>),
    /// Any other status with an empty body.
    Status(u16),
    /// `200` with the given body, verbatim.
    Raw(&'static str),
}

impl Reply {
    pub fn ok(sum: f64) -> Self {
        Reply::Ok { sum }
    }

    pub fn retry_after(secs: &'static str) -> Self {
        Reply::TooMany(Some(secs))
    }

    fn render(&self, order_id: &str) -> Response {
        match self {
            Reply::Ok { sum } => {
                let body = serde_json::json!({
                    "order": order_id,
                    "sum": sum,
                    "processed_at": PROCESSED_AT,
                });
                (StatusCode::OK, body.to_string()).into_response()
            }
            Reply::NoContent => StatusCode::NO_CONTENT.into_response(),
            Reply::TooMany(Some(value)) => {
                (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, *value)]).into_response()
            }
            Reply::TooMany(None) => StatusCode::TOO_MANY_REQUESTS.into_response(),
            Reply::Status(code) => StatusCode::from_u16(*code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response(),
            Reply::Raw(body) => (StatusCode::OK, *body).into_response(),
        }
    }
}

#[derive(Default)]
struct Inner {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    delays: Mutex<HashMap<String, Duration>>,
    default_delay: Mutex<Duration>,
    hits: Mutex<HashMap<String, usize>>,
    content_types: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Inner {
    fn next_reply(&self, order_id: &str) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(order_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::NoContent),
            None => Reply::NoContent,
        }
    }

    fn delay_for(&self, order_id: &str) -> Duration {
        self.delays
            .lock()
            .unwrap()
            .get(order_id)
            .copied()
            .unwrap_or(*self.default_delay.lock().unwrap())
    }
}

/// Decrements the in-flight gauge even if the client hangs up mid-request.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn order_handler(
    State(inner): State<Arc<Inner>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let now = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    let _guard = InFlight(&inner.in_flight);
    inner.max_in_flight.fetch_max(now, Ordering::SeqCst);

    *inner.hits.lock().unwrap().entry(order_id.clone()).or_default() += 1;
    if let Some(value) = headers.get(header::CONTENT_TYPE) {
        inner
            .content_types
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let reply = inner.next_reply(&order_id);
    let delay = inner.delay_for(&order_id);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    reply.render(&order_id)
}

/// Handle to a running mock accrual service.
pub struct MockAccrual {
    addr: SocketAddr,
    inner: Arc<Inner>,
    server: tokio::task::JoinHandle<()>,
}

impl MockAccrual {
    pub async fn start() -> Self {
        let inner = Arc::new(Inner::default());
        let app = Router::new()
            .route("/api/orders/{id}", get(order_handler))
            .with_state(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock accrual");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock accrual server");
        });

        Self {
            addr,
            inner,
            server,
        }
    }

    /// The address the way operators configure it: `host:port`, no scheme.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn script(&self, order_id: &str, replies: impl IntoIterator<Item = Reply>) -> &Self {
        self.inner
            .scripts
            .lock()
            .unwrap()
            .insert(order_id.to_string(), replies.into_iter().collect());
        self
    }

    /// Delays every reply for orders without their own delay.
    pub fn delay_all(&self, delay: Duration) -> &Self {
        *self.inner.default_delay.lock().unwrap() = delay;
        self
    }

    pub fn delay(&self, order_id: &str, delay: Duration) -> &Self {
        self.inner
            .delays
            .lock()
            .unwrap()
            .insert(order_id.to_string(), delay);
        self
    }

    pub fn hits(&self, order_id: &str) -> usize {
        self.inner
            .hits
            .lock()
            .unwrap()
            .get(order_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.inner.hits.lock().unwrap().values().sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn content_types(&self) -> Vec<String> {
        self.inner.content_types.lock().unwrap().clone()
    }

    pub fn accrual_settings(&self) -> AccrualSettings {
        AccrualSettings {
            address: self.address(),
            ..AccrualSettings::default()
        }
    }

    pub fn client(&self) -> AccrualClient {
        AccrualClient::new(&self.accrual_settings()).expect("accrual client")
    }

    pub fn app_config(&self, query_limit: usize, policy: FailurePolicy) -> AppConfig {
        let mut config = AppConfig::default().with_accrual_address(self.address());
        config.dispatch.query_limit = query_limit;
        config.dispatch.on_failure = policy;
        config
    }
}

impl Drop for MockAccrual {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// An address nothing listens on.
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}
