//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing` subscriber filtered by
//! `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Batches**: one `fetch_all_with` span per call with `orders` and `query_limit`
//! - **Orders**: one `fetch_gated` span per order carrying `order_id`; attempts,
//!   throttling (`retry_after_secs`) and failures are logged inside it
//! - **Store**: actor start/stop, registrations and uploads
//!
//! ## Usage Examples
//!
//! ```bash
//! # Batch summaries and failures
//! RUST_LOG=info cargo run -- -r localhost:8081 12345678903
//!
//! # Every attempt of every order
//! RUST_LOG=loyalty_withdrawals::accrual=debug cargo run -- -r localhost:8081 12345678903
//! ```
//!
//! With `RUST_LOG=debug` a throttled order reads like:
//!
//! ```text
//! DEBUG fetch_all_with:fetch_gated: Requesting accrual attempt=1 order_id="12345678903"
//! WARN  fetch_all_with:fetch_gated: Rate limited, backing off attempt=1 retry_after_secs=1
//! DEBUG fetch_all_with:fetch_gated: Requesting accrual attempt=2 order_id="12345678903"
//! DEBUG fetch_all_with:fetch_gated: Found attempt=2 sum=500.5
//! INFO  fetch_all_with: Batch complete found=1
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
