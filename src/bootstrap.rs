//! Process wiring: lock, user record, saver, journal and the coordinator.

use crate::config::VisionSaveConfig;
use crate::coordinator::{Coordinator, CoordinatorHandle, HttpImageSaver, QuotaPolicy};
use crate::decision_log::DecisionLog;
use crate::detector::{Detector, HoverSettings, PageEffects};
use crate::domain::{Clock, CoordinatorServices, SystemClock};
use crate::paths;
use crate::payments::{PaymentDesk, PaymentLedger};
use crate::status::StatusFeed;
use crate::store::{CoordinatorLock, FileUserStore};
use anyhow::Result;
use ractor::concurrency::JoinHandle;
use std::sync::Arc;

/// A running installation: the single coordinator and what hangs off it.
pub struct VisionSave {
    config: VisionSaveConfig,
    handle: CoordinatorHandle,
    clock: Arc<dyn Clock>,
    join: JoinHandle<()>,
    _lock: CoordinatorLock,
}

impl VisionSave {
    /// Starts the coordinator for the installation under the visionsave home.
    ///
    /// Installs the user record on first run. Fails if another process
    /// already owns the coordinator.
    pub async fn start(config: VisionSaveConfig) -> Result<Self> {
        Self::start_with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn start_with_clock(config: VisionSaveConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let lock = CoordinatorLock::acquire(&paths::coordinator_lock_path()?)?;

        let store = Arc::new(FileUserStore::new(paths::user_record_path()?));
        let record = store.load_or_install(clock.as_ref())?;

        let download_dir = match &config.download_dir {
            Some(dir) => dir.clone(),
            None => paths::downloads_dir()?,
        };
        let saver = Arc::new(HttpImageSaver::new(download_dir, config.request_timeout()));
        let journal = Arc::new(DecisionLog::new(&record.id.to_string(), &paths::logs_dir()?)?);

        let services = CoordinatorServices::new(clock.clone(), saver);
        let (coordinator, snapshot_rx) = Coordinator::new(
            record,
            store,
            services,
            QuotaPolicy::from_config(&config),
            config.filename_prefix.clone(),
        );
        let coordinator = coordinator.with_journal(journal);
        let (handle, join) = CoordinatorHandle::spawn(coordinator, snapshot_rx).await?;

        tracing::debug!(lock = %lock.path().display(), "Coordinator started");
        Ok(Self {
            config,
            handle,
            clock,
            join,
            _lock: lock,
        })
    }

    pub fn config(&self) -> &VisionSaveConfig {
        &self.config
    }

    pub fn handle(&self) -> &CoordinatorHandle {
        &self.handle
    }

    pub fn status_feed(&self) -> StatusFeed {
        StatusFeed::new(self.handle.subscribe(), self.config.daily_limit)
    }

    pub fn payment_desk(&self) -> Result<PaymentDesk> {
        Ok(PaymentDesk::new(
            PaymentLedger::new(paths::payments_path()?),
            self.handle.clone(),
            self.clock.clone(),
            self.config.premium_price,
        ))
    }

    /// A detector for one page context, sharing this coordinator.
    pub fn detector(&self, effects: Arc<dyn PageEffects>) -> Detector {
        Detector::new(
            Arc::new(self.handle.clone()),
            effects,
            HoverSettings::from_config(&self.config),
        )
    }

    /// Stops the coordinator and releases the lock.
    pub async fn shutdown(self) {
        self.handle.stop();
        if let Err(e) = self.join.await {
            tracing::warn!("Coordinator task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
