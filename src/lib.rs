//! # Loyalty Withdrawals
//!
//! > **Withdrawal history for a loyalty programme, enriched from an external accrual service.**
//!
//! A user owns a list of uploaded orders. For each order the accrual service
//! may know a withdrawal record (sum and processing time). This crate loads the
//! user, asks the accrual service about every order in parallel, and returns the
//! records that exist, or fails the whole request if any order could not be
//! fetched.
//!
//! ## 🏗️ Design Philosophy
//!
//! - **Bounded fan-out**: one task per order, at most `query_limit` requests in flight.
//! - **Cooperative throttling**: a `429` is honoured by sleeping for `Retry-After`
//!   seconds, up to a fixed number of attempts.
//! - **All or nothing**: a single failed order fails the batch; partial results are
//!   never returned.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each layer owns its error enum ([`FetchError`](accrual::FetchError),
//! [`BatchError`](dispatch::BatchError), [`RepositoryError`](repository::RepositoryError),
//! [`WithdrawalError`](service::WithdrawalError)). Lower errors stay reachable through
//! `source()`, so callers can match on a coarse variant while logs keep the detail.
//!
//! ### 2. Single Writer
//! Workers never share the result vector. They report over a channel and the
//! dispatcher merges, so no lock guards the results.
//!
//! ### 3. Cancellation
//! A failed order cancels its siblings through a `CancellationToken`
//! (configurable, see [`FailurePolicy`](config::FailurePolicy)); dropping the batch
//! future aborts every worker.
//!
//! ### 4. Observability
//! `tracing` spans per batch and per order. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Fetcher ([`accrual`])
//! - **Role**: One order, one retry loop, one typed outcome.
//! - **Key items**: [`AccrualClient`](accrual::AccrualClient),
//!   [`parse_retry_after`](accrual::parse_retry_after).
//!
//! ### 2. The Dispatcher ([`dispatch`])
//! - **Role**: Runs the per-order fetches of a batch under a shared permit pool.
//! - **Key items**: [`Dispatcher`](dispatch::Dispatcher), [`RequestLimit`](dispatch::RequestLimit).
//!
//! ### 3. The Use Case ([`service`])
//! - **Role**: Loads the user, fetches, classifies failures.
//! - **Key items**: [`WithdrawalService`](service::WithdrawalService).
//!
//! ### 4. Storage ([`repository`])
//! - **Role**: The [`UserRepository`](repository::UserRepository) seam, an in-memory
//!   actor implementation, and a mock for tests.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! - **Role**: Spins the store up, wires the service, shuts everything down.
//! - **Key items**: [`LoyaltySystem`](lifecycle::LoyaltySystem).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Ask a local accrual service about two orders
//! RUST_LOG=info cargo run -- -r localhost:8081 12345678903 79927398713
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod accrual;
pub mod config;
pub mod dispatch;
pub mod lifecycle;
pub mod model;
pub mod repository;
pub mod service;
