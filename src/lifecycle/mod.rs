//! # System Lifecycle
//!
//! Wiring and teardown of the running pieces.
//!
//! **Key Responsibilities:**
//! 1. **Store startup** - Spawn the [`UserStore`](crate::repository::UserStore) actor
//! 2. **Dependency wiring** - Build the accrual client, the dispatcher and the
//!    [`WithdrawalService`](crate::service::WithdrawalService) on top of the store
//! 3. **Graceful shutdown** - Drop every client, then wait for the actor to exit
//! 4. **Observability setup** - [`setup_tracing`]
//!
//! ```rust,ignore
//! let system = LoyaltySystem::new(&AppConfig::load(None)?)?;
//!
//! let user_id = system.store.register_user("alice").await?;
//! system.store.upload_order(&user_id, "12345678903").await?;
//! let withdrawals = system.withdrawals.get_user_withdrawals(&user_id).await?;
//!
//! system.shutdown().await?;
//! ```

pub mod loyalty_system;
pub mod tracing;

pub use self::loyalty_system::*;
pub use self::tracing::setup_tracing;
