use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables for quota enforcement, hover detection and saving.
///
/// Every field is optional in the YAML file; missing fields take the
/// extension's stock values.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VisionSaveConfig {
    /// Free-tier downloads per calendar day. Default: 10
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// Minimum spacing between accepted download attempts. Default: 2000
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Sustained hover needed before an intent is emitted. Default: 1000
    #[serde(default = "default_hover_delay_ms")]
    pub hover_delay_ms: u64,
    /// How long the highlight stays after an allowed download. Default: 1500
    #[serde(default = "default_highlight_hold_ms")]
    pub highlight_hold_ms: u64,
    /// Prefix of saved file names. Default: "VisionSave_"
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
    /// Where images are saved. Defaults to `~/.visionsave/downloads`.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Premium price in BDT, used for revenue stats. Default: 500
    #[serde(default = "default_premium_price")]
    pub premium_price: u32,
    /// Global timeout for fetching an image. Default: 30
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_daily_limit() -> u32 {
    10
}

fn default_cooldown_ms() -> u64 {
    2000
}

fn default_hover_delay_ms() -> u64 {
    1000
}

fn default_highlight_hold_ms() -> u64 {
    1500
}

fn default_filename_prefix() -> String {
    "VisionSave_".to_string()
}

fn default_premium_price() -> u32 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for VisionSaveConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            cooldown_ms: default_cooldown_ms(),
            hover_delay_ms: default_hover_delay_ms(),
            highlight_hold_ms: default_highlight_hold_ms(),
            filename_prefix: default_filename_prefix(),
            download_dir: None,
            premium_price: default_premium_price(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl VisionSaveConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.daily_limit == 0 {
            anyhow::bail!("daily_limit must be at least 1");
        }
        if self.cooldown_ms == 0 {
            anyhow::bail!("cooldown_ms must be greater than zero");
        }
        if self.hover_delay_ms == 0 {
            anyhow::bail!("hover_delay_ms must be greater than zero");
        }
        if self.filename_prefix.trim().is_empty() {
            anyhow::bail!("filename_prefix must not be empty");
        }
        if self.filename_prefix.contains(['/', '\\']) {
            anyhow::bail!(
                "filename_prefix must not contain path separators: {}",
                self.filename_prefix
            );
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    pub fn highlight_hold(&self) -> Duration {
        Duration::from_millis(self.highlight_hold_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
