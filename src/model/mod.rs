//! Pure data structures shared by the fetcher, the store and the service.

pub mod order;
pub mod user;
pub mod withdrawal;

pub use order::*;
pub use user::*;
pub use withdrawal::*;
