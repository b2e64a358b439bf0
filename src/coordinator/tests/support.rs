//! Shared fixtures for coordinator tests.

use crate::coordinator::engine::Coordinator;
use crate::coordinator::quota::QuotaPolicy;
use crate::coordinator::saver::ImageSaver;
use crate::domain::{CoordinatorServices, ManualClock, UserRecord, Username};
use crate::store::{FileUserStore, UserStore};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::watch;

pub const TODAY: &str = "2026-10-18";
pub const YESTERDAY: &str = "2026-10-17";
pub const START_MILLIS: i64 = 1_760_000_000_000;

/// Records every save and succeeds unless told to fail.
#[derive(Default)]
pub struct RecordingSaver {
    pub saves: Mutex<Vec<(String, String)>>,
    pub fail: Mutex<bool>,
}

impl RecordingSaver {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn saved_names(&self) -> Vec<String> {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageSaver for RecordingSaver {
    async fn save(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("simulated save failure for {}", url);
        }
        self.saves
            .lock()
            .unwrap()
            .push((url.to_string(), file_name.to_string()));
        Ok(PathBuf::from("/downloads").join(file_name))
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub saver: Arc<RecordingSaver>,
    pub store: Arc<FileUserStore>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileUserStore::new(dir.path().join("user.json")));
        Self {
            dir,
            clock: Arc::new(ManualClock::new(START_MILLIS, TODAY)),
            saver: Arc::new(RecordingSaver::default()),
            store,
        }
    }

    pub fn record(&self, tier: crate::domain::Tier, count: u32, day: &str) -> UserRecord {
        let mut record = UserRecord::new(Username::from("Swift_Panda_42"), day.into(), 0);
        record.tier = tier;
        record.usage_count = count;
        self.store.save(&record).unwrap();
        record
    }

    pub fn coordinator(&self, record: UserRecord) -> (Coordinator, watch::Receiver<UserRecord>) {
        self.coordinator_with_saver(record, self.saver.clone())
    }

    pub fn coordinator_with_saver(
        &self,
        record: UserRecord,
        saver: Arc<dyn ImageSaver>,
    ) -> (Coordinator, watch::Receiver<UserRecord>) {
        let services = CoordinatorServices::new(self.clock.clone(), saver);
        Coordinator::new(
            record,
            self.store.clone(),
            services,
            QuotaPolicy::default(),
            "VisionSave_",
        )
    }

    pub fn stored(&self) -> UserRecord {
        self.store.load().unwrap().unwrap()
    }
}
