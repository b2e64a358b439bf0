//! Pure quota and cooldown checks.

use crate::config::VisionSaveConfig;
use crate::domain::UserRecord;

/// Limits applied by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Free-tier downloads per usage day.
    pub daily_limit: u32,
    /// Minimum spacing between accepted attempts, in milliseconds.
    pub cooldown_ms: i64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            daily_limit: 10,
            cooldown_ms: 2000,
        }
    }
}

impl QuotaPolicy {
    pub fn from_config(config: &VisionSaveConfig) -> Self {
        Self {
            daily_limit: config.daily_limit,
            cooldown_ms: i64::try_from(config.cooldown_ms).unwrap_or(i64::MAX),
        }
    }

    /// True when a quota-limited tier has used up today's allowance.
    ///
    /// The caller must roll the record over to today first.
    pub fn quota_exhausted(&self, record: &UserRecord) -> bool {
        record.tier.is_quota_limited() && record.usage_count >= self.daily_limit
    }
}

/// Process-wide rate limit state. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownState {
    /// Epoch millis of the last attempt that reached the save step.
    pub last_download_at: Option<i64>,
}

impl CooldownState {
    /// True while `now` is inside the window opened by the last attempt.
    pub fn is_cooling(&self, now: i64, cooldown_ms: i64) -> bool {
        match self.last_download_at {
            Some(last) => now.saturating_sub(last) < cooldown_ms,
            None => false,
        }
    }

    /// Opens a new window at `now`.
    pub fn consume(&mut self, now: i64) {
        self.last_download_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Tier, UserRecord, Username};

    fn record(tier: Tier, count: u32) -> UserRecord {
        let mut record = UserRecord::new(Username::from("t"), "2026-10-18".into(), 0);
        record.tier = tier;
        record.usage_count = count;
        record
    }

    #[test]
    fn test_fresh_cooldown_never_blocks() {
        let cooldown = CooldownState::default();
        assert!(!cooldown.is_cooling(0, 2000));
        assert!(!cooldown.is_cooling(i64::MIN, 2000));
    }

    #[test]
    fn test_cooldown_window_boundaries() {
        let mut cooldown = CooldownState::default();
        cooldown.consume(10_000);
        assert!(cooldown.is_cooling(10_000, 2000));
        assert!(cooldown.is_cooling(11_999, 2000));
        assert!(!cooldown.is_cooling(12_000, 2000));
    }

    #[test]
    fn test_clock_going_backwards_stays_cooling() {
        let mut cooldown = CooldownState::default();
        cooldown.consume(10_000);
        assert!(cooldown.is_cooling(5_000, 2000));
    }

    #[test]
    fn test_free_quota() {
        let policy = QuotaPolicy::default();
        assert!(!policy.quota_exhausted(&record(Tier::Free, 9)));
        assert!(policy.quota_exhausted(&record(Tier::Free, 10)));
        assert!(policy.quota_exhausted(&record(Tier::Free, 11)));
    }

    #[test]
    fn test_pending_and_premium_are_exempt() {
        let policy = QuotaPolicy::default();
        assert!(!policy.quota_exhausted(&record(Tier::Pending, 50)));
        assert!(!policy.quota_exhausted(&record(Tier::Premium, 500)));
    }

    #[test]
    fn test_policy_from_config() {
        let config = VisionSaveConfig {
            daily_limit: 3,
            cooldown_ms: 750,
            ..VisionSaveConfig::default()
        };
        let policy = QuotaPolicy::from_config(&config);
        assert_eq!(policy.daily_limit, 3);
        assert_eq!(policy.cooldown_ms, 750);
    }
}
