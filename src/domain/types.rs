//! Strongly typed domain primitives for the quota coordinator.
//!
//! The persisted `UserRecord` keeps the historical field names of the
//! extension's storage record (`status`, `downloadsToday`, `lastDate`) so an
//! existing `user.json` keeps loading.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable installation identifier. Created once at first run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Creates a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a user ID from its hyphenated string form.
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cosmetic display name, generated once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Username {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Username {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Subscription tier.
///
/// `Free -> Pending` on payment submission, `Pending -> Premium` on approval.
/// There is no reverse transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    #[default]
    Free,
    Pending,
    Premium,
}

impl Tier {
    /// Only the free tier is subject to the daily quota.
    pub fn is_quota_limited(&self) -> bool {
        matches!(self, Tier::Free)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "FREE"),
            Tier::Pending => write!(f, "PENDING"),
            Tier::Premium => write!(f, "PREMIUM"),
        }
    }
}

/// Calendar day a usage count applies to.
///
/// Compared by string equality only; never parsed back into a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageDay(pub String);

impl UsageDay {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UsageDay {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UsageDay {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The single per-installation user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: Username,
    #[serde(rename = "status")]
    pub tier: Tier,
    #[serde(rename = "downloadsToday", default)]
    pub usage_count: u32,
    #[serde(rename = "lastDate")]
    pub usage_day: UsageDay,
    /// Epoch milliseconds of first run.
    #[serde(default)]
    pub joined_at: i64,
}

impl UserRecord {
    /// Creates a fresh free-tier record for a first run.
    pub fn new(username: Username, today: UsageDay, joined_at: i64) -> Self {
        Self {
            id: UserId::new(),
            username,
            tier: Tier::Free,
            usage_count: 0,
            usage_day: today,
            joined_at,
        }
    }

    /// Resets the counter when `today` differs from the recorded usage day.
    ///
    /// Returns true if the record changed and must be persisted.
    pub fn roll_over(&mut self, today: &UsageDay) -> bool {
        if &self.usage_day == today {
            return false;
        }
        self.usage_count = 0;
        self.usage_day = today.clone();
        true
    }
}

/// A request to download the image at `url`. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadIntent {
    pub url: String,
}

impl DownloadIntent {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Outcome of a single `decide` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Saved; carries the post-increment usage count.
    Allow { count: u32 },
    /// Arrived inside the cooldown window.
    DenyCooldown,
    /// Free-tier daily limit reached.
    DenyQuota,
    /// The save side effect failed. The cooldown slot is still consumed.
    Error,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow { .. } => "allow",
            Decision::DenyCooldown => "deny_cooldown",
            Decision::DenyQuota => "deny_quota",
            Decision::Error => "error",
        }
    }
}
