//! Persistence for the installation's user record.
//!
//! The record lives in a single JSON file. Writes go to a temporary file
//! first and are renamed into place so a crash never leaves a torn record.

use crate::domain::{Clock, UserRecord, Username};
use crate::username::generate_username;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read/write access to the persisted user record.
pub trait UserStore: Send + Sync {
    /// Returns the stored record, or `None` before first run.
    fn load(&self) -> Result<Option<UserRecord>>;

    /// Replaces the stored record.
    fn save(&self, record: &UserRecord) -> Result<()>;
}

/// `UserStore` backed by `user.json`.
#[derive(Debug, Clone)]
pub struct FileUserStore {
    path: PathBuf,
}

impl FileUserStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, creating a fresh free-tier one on first run.
    ///
    /// An existing record is returned untouched.
    pub fn load_or_install(&self, clock: &dyn Clock) -> Result<UserRecord> {
        if let Some(record) = self.load()? {
            return Ok(record);
        }

        let record = UserRecord::new(
            Username::from(generate_username()),
            clock.today(),
            clock.now_millis(),
        );
        self.save(&record)?;
        tracing::info!(
            user_id = %record.id,
            username = record.username.as_str(),
            "Installed new user record"
        );
        Ok(record)
    }
}

impl UserStore for FileUserStore {
    fn load(&self) -> Result<Option<UserRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read user record: {}", self.path.display()))?;
        let record: UserRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse user record: {}", self.path.display()))?;
        Ok(Some(record))
    }

    fn save(&self, record: &UserRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(record)
            .context("Failed to serialize user record to JSON")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).with_context(|| {
            format!("Failed to write temp user record: {}", temp_path.display())
        })?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename temp file to: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ManualClock, Tier, UsageDay};
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path().join("user.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_install_creates_free_record() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path().join("user.json"));
        let clock = ManualClock::new(1_700_000_000_000, "2026-10-18");

        let record = store.load_or_install(&clock).unwrap();
        assert_eq!(record.tier, Tier::Free);
        assert_eq!(record.usage_count, 0);
        assert_eq!(record.usage_day, UsageDay::from("2026-10-18"));
        assert_eq!(record.joined_at, 1_700_000_000_000);
        assert_eq!(store.load().unwrap(), Some(record));
    }

    #[test]
    fn test_install_keeps_existing_record() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path().join("user.json"));
        let clock = ManualClock::new(0, "2026-10-18");

        let first = store.load_or_install(&clock).unwrap();
        clock.set_day("2026-10-19");
        let second = store.load_or_install(&clock).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.username, second.username);
        assert_eq!(second.usage_day, UsageDay::from("2026-10-18"));
    }

    #[test]
    fn test_persisted_layout_uses_record_field_names() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path().join("user.json"));
        let mut record = UserRecord::new(Username::from("Swift_Panda_1"), "2026-10-18".into(), 7);
        record.tier = Tier::Pending;
        record.usage_count = 3;
        store.save(&record).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["username"], "Swift_Panda_1");
        assert_eq!(raw["status"], "PENDING");
        assert_eq!(raw["downloadsToday"], 3);
        assert_eq!(raw["lastDate"], "2026-10-18");
        assert!(!dir.path().join("user.json.tmp").exists());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.json");
        fs::write(&path, "not json").unwrap();
        let store = FileUserStore::new(path);
        assert!(store.load().is_err());
    }
}
