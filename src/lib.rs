//! VisionSave: hover-to-download images under a daily free quota and a
//! global cooldown, with a manually verified Premium upgrade.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod decision_log;
pub mod detector;
pub mod domain;
pub mod logging;
pub mod paths;
pub mod payments;
pub mod protocol;
pub mod serve;
pub mod status;
pub mod store;
pub mod username;
