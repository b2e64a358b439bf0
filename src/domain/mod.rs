//! Domain model for the download quota coordinator.
//!
//! # Architecture
//!
//! - **Types** (`types.rs`): user record, tiers, intents and decisions
//! - **Errors** (`errors.rs`): failures outside the decision enum
//! - **Services** (`services.rs`): injected clock and image saver

pub mod errors;
pub mod services;
pub mod types;

pub use errors::CoordinatorError;
pub use services::{Clock, CoordinatorServices, ManualClock, SystemClock};
pub use types::{Decision, DownloadIntent, Tier, UsageDay, UserId, UserRecord, Username};
