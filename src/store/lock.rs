//! Exclusive ownership of the coordinator per installation.
//!
//! Cooldown and quota are only global if a single coordinator runs against a
//! given `user.json`. The lock is held for the lifetime of `CoordinatorLock`.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct CoordinatorLock {
    file: File,
    path: PathBuf,
}

impl CoordinatorLock {
    /// Takes the lock without waiting.
    ///
    /// Fails if another process already owns the coordinator.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                file,
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                anyhow::bail!(
                    "Another visionsave coordinator is already running (lock: {})",
                    path.display()
                )
            }
            Err(e) => Err(e).context("Failed to acquire coordinator lock"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CoordinatorLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
