//! Centralized home-based storage paths for all visionsave persistence.
//!
//! Everything lives under `~/.visionsave/` (or `$VISIONSAVE_HOME`):
//! - `user.json` - The installation's user record
//! - `payments.json` - Payment request ledger
//! - `config.yaml` - Optional configuration overrides
//! - `coordinator.lock` - Held by the process that owns the coordinator
//! - `downloads/` - Saved images
//! - `logs/decisions.jsonl` - Decision journal

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// The name of the visionsave directory.
const VISIONSAVE_DIR: &str = ".visionsave";

/// Environment variable that relocates the whole store.
pub const HOME_ENV: &str = "VISIONSAVE_HOME";

/// Returns the visionsave home directory, creating it if needed.
///
/// # Errors
///
/// Returns an error if:
/// - Home directory cannot be determined
/// - Directory creation fails
pub fn visionsave_home_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => dirs::home_dir()
            .context("Could not determine home directory for visionsave storage")?
            .join(VISIONSAVE_DIR),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create visionsave directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the user record path: `~/.visionsave/user.json`
pub fn user_record_path() -> Result<PathBuf> {
    Ok(visionsave_home_dir()?.join("user.json"))
}

/// Returns the payment ledger path: `~/.visionsave/payments.json`
pub fn payments_path() -> Result<PathBuf> {
    Ok(visionsave_home_dir()?.join("payments.json"))
}

/// Returns the config file path: `~/.visionsave/config.yaml`
pub fn config_path() -> Result<PathBuf> {
    Ok(visionsave_home_dir()?.join("config.yaml"))
}

/// Returns the coordinator lock path: `~/.visionsave/coordinator.lock`
pub fn coordinator_lock_path() -> Result<PathBuf> {
    Ok(visionsave_home_dir()?.join("coordinator.lock"))
}

/// Returns the server socket path: `~/.visionsave/visionsave.sock`
pub fn socket_path() -> Result<PathBuf> {
    Ok(visionsave_home_dir()?.join("visionsave.sock"))
}

/// Returns the default downloads directory: `~/.visionsave/downloads/`
///
/// Creates the directory if it doesn't exist.
pub fn downloads_dir() -> Result<PathBuf> {
    let dir = visionsave_home_dir()?.join("downloads");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create downloads directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the logs directory: `~/.visionsave/logs/`
///
/// Creates the directory if it doesn't exist.
pub fn logs_dir() -> Result<PathBuf> {
    let dir = visionsave_home_dir()?.join("logs");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
pub(crate) mod tests;
