//! The quota/cooldown state machine.
//!
//! `Coordinator` is the only place the usage counter, the usage day, the tier
//! and the cooldown timestamp change. It is driven one message at a time by
//! the coordinator actor and broadcasts every persisted change on a watch
//! channel for the status projection.

use crate::coordinator::quota::{CooldownState, QuotaPolicy};
use crate::coordinator::saver::download_file_name;
use crate::decision_log::DecisionLog;
use crate::domain::{
    Clock, CoordinatorError, CoordinatorServices, Decision, DownloadIntent, Tier, UserId,
    UserRecord,
};
use crate::store::UserStore;
use std::sync::Arc;
use tokio::sync::watch;

pub struct Coordinator {
    record: UserRecord,
    cooldown: CooldownState,
    policy: QuotaPolicy,
    filename_prefix: String,
    store: Arc<dyn UserStore>,
    services: CoordinatorServices,
    journal: Option<Arc<DecisionLog>>,
    snapshot_tx: watch::Sender<UserRecord>,
}

impl Coordinator {
    /// Creates a coordinator owning `record`.
    ///
    /// Returns the coordinator and a watch receiver for record snapshots.
    pub fn new(
        record: UserRecord,
        store: Arc<dyn UserStore>,
        services: CoordinatorServices,
        policy: QuotaPolicy,
        filename_prefix: impl Into<String>,
    ) -> (Self, watch::Receiver<UserRecord>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(record.clone());
        let coordinator = Self {
            record,
            cooldown: CooldownState::default(),
            policy,
            filename_prefix: filename_prefix.into(),
            store,
            services,
            journal: None,
            snapshot_tx,
        };
        (coordinator, snapshot_rx)
    }

    /// Attaches a decision journal.
    pub fn with_journal(mut self, journal: Arc<DecisionLog>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    pub fn cooldown(&self) -> CooldownState {
        self.cooldown
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.services.clock.clone()
    }

    /// Decides one download intent and performs the save when allowed.
    pub async fn decide(&mut self, intent: DownloadIntent) -> Decision {
        let now = self.services.clock.now_millis();
        self.decide_received(intent, now).await
    }

    /// Decides an intent that arrived at `received_at` (epoch millis).
    ///
    /// The cooldown check and the saved file name both use the arrival time,
    /// so intents queued behind a slow save are judged by when they were sent.
    pub async fn decide_received(&mut self, intent: DownloadIntent, received_at: i64) -> Decision {
        let decision = self.decide_at(&intent, received_at).await;
        if let Some(journal) = &self.journal {
            journal.log_decision(&intent.url, &decision, received_at);
        }
        decision
    }

    async fn decide_at(&mut self, intent: &DownloadIntent, now: i64) -> Decision {
        // Denials never extend the window.
        if self.cooldown.is_cooling(now, self.policy.cooldown_ms) {
            tracing::debug!(url = %intent.url, "Download denied: cooldown");
            return Decision::DenyCooldown;
        }

        self.roll_over_if_needed();

        if self.policy.quota_exhausted(&self.record) {
            tracing::info!(
                count = self.record.usage_count,
                limit = self.policy.daily_limit,
                "Download denied: daily quota reached"
            );
            return Decision::DenyQuota;
        }

        // The slot is consumed even if the save fails.
        self.cooldown.consume(now);

        let file_name = download_file_name(&self.filename_prefix, now);
        match self.services.saver.save(&intent.url, &file_name).await {
            Ok(path) => {
                self.record.usage_count = self.record.usage_count.saturating_add(1);
                self.persist_best_effort();
                tracing::info!(
                    url = %intent.url,
                    path = %path.display(),
                    count = self.record.usage_count,
                    "Download saved"
                );
                Decision::Allow {
                    count: self.record.usage_count,
                }
            }
            Err(e) => {
                tracing::warn!(url = %intent.url, "Download failed: {:#}", e);
                Decision::Error
            }
        }
    }

    /// Resets a stale usage day. Runs at most once per new day because the
    /// corrected day is written back immediately.
    fn roll_over_if_needed(&mut self) {
        let today = self.services.clock.today();
        let previous_day = self.record.usage_day.clone();
        let dropped = self.record.usage_count;
        if !self.record.roll_over(&today) {
            return;
        }
        tracing::info!(
            from = previous_day.as_str(),
            to = today.as_str(),
            dropped,
            "Usage day rolled over"
        );
        if let Some(journal) = &self.journal {
            journal.log_rollover(&previous_day, &today, dropped);
        }
        self.persist_best_effort();
    }

    /// Upgrades the tier to `Premium` after an external approval.
    pub fn approve(&mut self, user_id: &UserId) -> Result<UserRecord, CoordinatorError> {
        if &self.record.id != user_id {
            return Err(CoordinatorError::UnknownUser {
                user_id: user_id.to_string(),
            });
        }
        self.set_tier(Tier::Premium)
    }

    /// Moves a free user to `Pending` after a payment submission.
    pub fn mark_pending(&mut self) -> Result<UserRecord, CoordinatorError> {
        match self.record.tier {
            Tier::Free => self.set_tier(Tier::Pending),
            Tier::Pending => Ok(self.record.clone()),
            Tier::Premium => Err(CoordinatorError::InvalidTransition {
                message: "user is already premium".to_string(),
            }),
        }
    }

    fn set_tier(&mut self, tier: Tier) -> Result<UserRecord, CoordinatorError> {
        let previous = self.record.tier;
        if previous == tier {
            return Ok(self.record.clone());
        }

        self.record.tier = tier;
        if let Err(e) = self.store.save(&self.record) {
            self.record.tier = previous;
            return Err(CoordinatorError::StorageFailure {
                message: format!("{:#}", e),
            });
        }

        tracing::info!(from = %previous, to = %tier, "Tier changed");
        if let Some(journal) = &self.journal {
            journal.log_tier_change(previous, tier);
        }
        self.publish();
        Ok(self.record.clone())
    }

    /// Writes the record and publishes it. A failed write keeps the
    /// in-memory state, which stays authoritative for this process.
    fn persist_best_effort(&mut self) {
        if let Err(e) = self.store.save(&self.record) {
            tracing::warn!("Failed to persist user record: {:#}", e);
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.record.clone());
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
