//! Structured JSONL journal of coordinator decisions.
//!
//! Each line carries:
//! - A monotonic sequence number for ordering
//! - An ISO 8601 timestamp with microsecond precision
//! - The installation's user ID for correlation
//! - Structured event data in JSON format

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::{Decision, Tier, UsageDay};

/// Append-only decision journal.
pub struct DecisionLog {
    user_id: String,
    seq: AtomicU64,
    log_file: Mutex<File>,
    log_path: PathBuf,
}

/// A single journal entry in JSONL format.
#[derive(Serialize, serde::Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number (unique per process)
    pub seq: u64,
    /// ISO 8601 timestamp with microseconds
    pub ts: String,
    pub user_id: String,
    /// Component that emitted the entry
    pub component: String,
    pub event: Value,
}

impl DecisionLog {
    /// Opens (or creates) `<logs_dir>/decisions.jsonl`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The logs directory cannot be created
    /// - The log file cannot be opened
    pub fn new(user_id: &str, logs_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(logs_dir)?;
        let log_path = logs_dir.join("decisions.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            user_id: user_id.to_string(),
            seq: AtomicU64::new(0),
            log_file: Mutex::new(file),
            log_path,
        })
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Writes one entry. Serialization or I/O failures are dropped.
    pub fn log(&self, component: &str, event: impl Serialize) {
        let entry = LogEntry {
            seq: self.next_seq(),
            ts: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            user_id: self.user_id.clone(),
            component: component.to_string(),
            event: serde_json::to_value(event).unwrap_or(Value::Null),
        };

        if let Ok(mut file) = self.log_file.lock() {
            if let Ok(line) = serde_json::to_string(&entry) {
                let _ = writeln!(file, "{}", line);
                let _ = file.flush();
            }
        }
    }

    /// Logs the outcome of a download intent.
    pub fn log_decision(&self, url: &str, decision: &Decision, at_millis: i64) {
        let count = match decision {
            Decision::Allow { count } => Some(*count),
            _ => None,
        };
        self.log(
            "Coordinator",
            serde_json::json!({
                "type": "Decision",
                "url": url,
                "decision": decision.label(),
                "count": count,
                "at_ms": at_millis
            }),
        );
    }

    /// Logs a usage-day rollover.
    pub fn log_rollover(&self, from: &UsageDay, to: &UsageDay, dropped_count: u32) {
        self.log(
            "Coordinator",
            serde_json::json!({
                "type": "DayRollover",
                "from": from.as_str(),
                "to": to.as_str(),
                "dropped_count": dropped_count
            }),
        );
    }

    /// Logs a tier transition.
    pub fn log_tier_change(&self, from: Tier, to: Tier) {
        self.log(
            "Coordinator",
            serde_json::json!({
                "type": "TierChange",
                "from": from.to_string(),
                "to": to.to_string()
            }),
        );
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
