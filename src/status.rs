//! Read-only status projection of the user record.
//!
//! Renders what the popup shows. Never performs day rollover; a stale
//! record is shown as persisted until the coordinator next decides.

use crate::domain::{Tier, UserRecord};
use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub username: String,
    pub user_id: String,
    pub tier: Tier,
    pub usage_count: u32,
    pub usage_day: String,
    /// `"<count> / <limit>"`, or `"Unlimited"` for Premium.
    pub usage_text: String,
    /// Progress towards the daily limit, capped at 100.
    pub percent: f64,
    pub limit_reached: bool,
}

impl StatusView {
    pub fn project(record: &UserRecord, daily_limit: u32) -> Self {
        let unlimited = record.tier == Tier::Premium;
        let usage_text = if unlimited {
            "Unlimited".to_string()
        } else {
            format!("{} / {}", record.usage_count, daily_limit)
        };
        let percent = if daily_limit == 0 {
            100.0
        } else {
            (f64::from(record.usage_count) / f64::from(daily_limit) * 100.0).min(100.0)
        };

        Self {
            username: record.username.as_str().to_string(),
            user_id: record.id.to_string(),
            tier: record.tier,
            usage_count: record.usage_count,
            usage_day: record.usage_day.as_str().to_string(),
            usage_text,
            percent,
            limit_reached: !unlimited && record.usage_count >= daily_limit,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self.tier {
            Tier::Free => "FREE",
            Tier::Pending => "VERIFYING PAYMENT",
            Tier::Premium => "PREMIUM",
        }
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.username, self.badge())?;
        writeln!(f, "  id:        {}", self.user_id)?;
        writeln!(f, "  usage:     {} ({:.0}%)", self.usage_text, self.percent)?;
        write!(f, "  usage day: {}", self.usage_day)?;
        if self.limit_reached {
            write!(f, "\n  Daily limit reached. Upgrade to Premium for unlimited downloads.")?;
        }
        Ok(())
    }
}

/// Follows coordinator snapshots and projects each one.
pub struct StatusFeed {
    rx: watch::Receiver<UserRecord>,
    daily_limit: u32,
}

impl StatusFeed {
    pub fn new(rx: watch::Receiver<UserRecord>, daily_limit: u32) -> Self {
        Self { rx, daily_limit }
    }

    pub fn current(&self) -> StatusView {
        StatusView::project(&self.rx.borrow(), self.daily_limit)
    }

    /// Waits for the next persisted change. Returns `None` once the
    /// coordinator is gone.
    pub async fn next(&mut self) -> Option<StatusView> {
        self.rx.changed().await.ok()?;
        Some(StatusView::project(
            &self.rx.borrow_and_update(),
            self.daily_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Username;

    fn record(tier: Tier, count: u32) -> UserRecord {
        let mut record = UserRecord::new(Username::from("Clever_Wolf_7"), "2026-10-18".into(), 0);
        record.tier = tier;
        record.usage_count = count;
        record
    }

    #[test]
    fn test_free_usage_text_and_percent() {
        let view = StatusView::project(&record(Tier::Free, 4), 10);
        assert_eq!(view.usage_text, "4 / 10");
        assert!((view.percent - 40.0).abs() < f64::EPSILON);
        assert!(!view.limit_reached);
        assert_eq!(view.badge(), "FREE");
    }

    #[test]
    fn test_limit_reached_caps_percent() {
        let free = StatusView::project(&record(Tier::Free, 12), 10);
        assert!(free.limit_reached);
        assert!((free.percent - 100.0).abs() < f64::EPSILON);

        let pending = StatusView::project(&record(Tier::Pending, 10), 10);
        assert!(pending.limit_reached);
        assert_eq!(pending.usage_text, "10 / 10");
    }

    #[test]
    fn test_premium_is_unlimited() {
        let view = StatusView::project(&record(Tier::Premium, 42), 10);
        assert_eq!(view.usage_text, "Unlimited");
        assert!(!view.limit_reached);
        assert!(view.to_string().contains("[PREMIUM]"));
    }

    #[tokio::test]
    async fn test_feed_follows_snapshots() {
        let (tx, rx) = watch::channel(record(Tier::Free, 1));
        let mut feed = StatusFeed::new(rx, 10);
        assert_eq!(feed.current().usage_count, 1);

        tx.send(record(Tier::Pending, 2)).unwrap();
        let view = feed.next().await.unwrap();
        assert_eq!(view.tier, Tier::Pending);
        assert_eq!(view.usage_text, "2 / 10");

        drop(tx);
        assert_eq!(feed.next().await, None);
    }
}
