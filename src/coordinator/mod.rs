//! The privileged, page-independent download coordinator.
//!
//! - `quota`: pure cooldown and quota checks
//! - `engine`: the state machine that owns the user record
//! - `actor`: ractor wrapper serializing every request
//! - `saver`: the download side effect

pub mod actor;
pub mod engine;
pub mod quota;
pub mod saver;

pub use actor::{CoordinatorActor, CoordinatorHandle, CoordinatorMessage};
pub use engine::Coordinator;
pub use quota::{CooldownState, QuotaPolicy};
pub use saver::{download_file_name, HttpImageSaver, ImageSaver};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
