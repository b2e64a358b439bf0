//! File-backed persistence for the user record and coordinator ownership.

pub mod lock;
pub mod user_store;

pub use lock::CoordinatorLock;
pub use user_store::{FileUserStore, UserStore};
