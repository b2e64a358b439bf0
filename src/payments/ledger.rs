//! Payment request records and their JSON ledger.

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const REQUEST_ID_LEN: usize = 9;
const REQUEST_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "bKash")]
    BKash,
    Nagad,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::BKash => f.pad("bKash"),
            PaymentMethod::Nagad => f.pad("Nagad"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bkash" => Ok(PaymentMethod::BKash),
            "nagad" => Ok(PaymentMethod::Nagad),
            other => Err(format!("unknown payment method '{}' (expected bkash or nagad)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => f.pad("PENDING"),
            PaymentStatus::Approved => f.pad("APPROVED"),
            PaymentStatus::Rejected => f.pad("REJECTED"),
        }
    }
}

/// A manual payment submission awaiting verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub phone_number: String,
    pub method: PaymentMethod,
    /// Epoch milliseconds of submission.
    pub timestamp: i64,
    pub status: PaymentStatus,
}

/// Random lowercase base-36 request id.
pub fn generate_request_id() -> String {
    let mut rng = rand::thread_rng();
    (0..REQUEST_ID_LEN)
        .map(|_| char::from(REQUEST_ID_ALPHABET[rng.gen_range(0..REQUEST_ID_ALPHABET.len())]))
        .collect()
}

/// `payments.json`: the full list of requests, oldest first.
#[derive(Debug, Clone)]
pub struct PaymentLedger {
    path: PathBuf,
}

impl PaymentLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<PaymentRequest>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read payments: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse payments: {}", self.path.display()))
    }

    pub fn save(&self, requests: &[PaymentRequest]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content =
            serde_json::to_string_pretty(requests).context("Failed to serialize payments")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!("Failed to rename temp file to: {}", self.path.display())
        })?;
        Ok(())
    }

    pub fn append(&self, request: PaymentRequest) -> Result<()> {
        let mut requests = self.load()?;
        requests.push(request);
        self.save(&requests)
    }
}
