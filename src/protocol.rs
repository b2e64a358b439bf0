//! Wire protocol between page contexts and the coordinator.
//!
//! Requests and responses are JSON objects tagged by `action` and `status`.

use crate::detector::IntentSink;
use crate::domain::{Decision, DownloadIntent};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Request sent by a page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadRequest {
    CheckAndDownload { url: String },
}

/// Coordinator's answer to a `DownloadRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadResponse {
    Success { count: u32 },
    LimitReached,
    Cooldown,
    Error,
}

impl From<Decision> for DownloadResponse {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Allow { count } => DownloadResponse::Success { count },
            Decision::DenyCooldown => DownloadResponse::Cooldown,
            Decision::DenyQuota => DownloadResponse::LimitReached,
            Decision::Error => DownloadResponse::Error,
        }
    }
}

impl From<DownloadResponse> for Decision {
    fn from(response: DownloadResponse) -> Self {
        match response {
            DownloadResponse::Success { count } => Decision::Allow { count },
            DownloadResponse::Cooldown => Decision::DenyCooldown,
            DownloadResponse::LimitReached => Decision::DenyQuota,
            DownloadResponse::Error => Decision::Error,
        }
    }
}

/// Routes one request to `sink`.
pub async fn dispatch(sink: &dyn IntentSink, request: DownloadRequest) -> DownloadResponse {
    match request {
        DownloadRequest::CheckAndDownload { url } => {
            sink.submit(DownloadIntent::new(url)).await.into()
        }
    }
}

/// Parses a JSON request, dispatches it, and returns the JSON response.
pub async fn dispatch_json(sink: &dyn IntentSink, raw: &str) -> Result<String> {
    let request: DownloadRequest =
        serde_json::from_str(raw).context("Failed to parse download request")?;
    let response = dispatch(sink, request).await;
    serde_json::to_string(&response).context("Failed to serialize download response")
}
