//! The download side effect.
//!
//! Format conversion is simulated: bytes are stored as fetched and the file
//! always carries the `.jpg` extension.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extension of every saved file.
pub const SAVED_EXTENSION: &str = "jpg";

/// Upper bound on a single image body.
const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// Persists the resource at `url` locally under `file_name`.
#[async_trait]
pub trait ImageSaver: Send + Sync {
    async fn save(&self, url: &str, file_name: &str) -> Result<PathBuf>;
}

/// `<prefix><millis>.jpg`. Unique because two saves are never closer than
/// the cooldown window.
pub fn download_file_name(prefix: &str, at_millis: i64) -> String {
    format!("{}{}.{}", prefix, at_millis, SAVED_EXTENSION)
}

/// Fetches over HTTP(S) with ureq, or copies `file://` URLs and local paths.
#[derive(Clone)]
pub struct HttpImageSaver {
    dir: PathBuf,
    agent: ureq::Agent,
}

impl HttpImageSaver {
    pub fn new(dir: PathBuf, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            dir,
            agent: config.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageSaver for HttpImageSaver {
    async fn save(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        let agent = self.agent.clone();
        let url = url.to_string();
        let target = self.dir.join(file_name);

        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let bytes = fetch_bytes(&agent, &url)?;
            write_atomic(&target, &bytes)?;
            Ok(target)
        })
        .await
        .context("Image save task panicked")?
    }
}

fn fetch_bytes(agent: &ureq::Agent, source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let mut response = agent
            .get(source)
            .header(
                "User-Agent",
                format!("visionsave/{}", env!("CARGO_PKG_VERSION")),
            )
            .call()
            .with_context(|| format!("Failed to fetch image: {}", source))?;
        return response
            .body_mut()
            .with_config()
            .limit(MAX_IMAGE_BYTES)
            .read_to_vec()
            .with_context(|| format!("Failed to read image body: {}", source));
    }

    let path = local_source_path(source)?;
    fs::read(&path).with_context(|| format!("Failed to read local image: {}", path.display()))
}

fn local_source_path(source: &str) -> Result<PathBuf> {
    if source.starts_with("file://") {
        let parsed = url::Url::parse(source)
            .with_context(|| format!("Invalid file URL: {}", source))?;
        return parsed
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("File URL has no local path: {}", source));
    }
    if source.contains("://") || source.starts_with("data:") {
        anyhow::bail!("Unsupported image source: {}", source);
    }
    Ok(PathBuf::from(source))
}

fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let temp_path = target.with_extension("part");
    fs::write(&temp_path, bytes)
        .with_context(|| format!("Failed to write image: {}", temp_path.display()))?;
    fs::rename(&temp_path, target)
        .with_context(|| format!("Failed to rename temp file to: {}", target.display()))?;
    Ok(())
}
