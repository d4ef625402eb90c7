// src/output.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[async_trait::async_trait]
pub trait FeedSink: Send + Sync {
    /// Replace the sink's content with `bytes`.
    async fn store(&self, bytes: &[u8]) -> Result<()>;
}

/// Writes to a sibling temp file, then renames over the target, so a failed
/// write leaves the previous feed in place.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "feed".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl FeedSink for FileSink {
    async fn store(&self, bytes: &[u8]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating output dir {}", dir.display()))?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("replacing {}", self.path.display()));
        }
        Ok(())
    }
}

// --- Test helper ---
pub struct MemorySink {
    pub writes: std::sync::Mutex<Vec<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            writes: std::sync::Mutex::new(vec![]),
        }
    }

    /// Last stored document as text, if any.
    pub fn last_text(&self) -> Option<String> {
        self.writes
            .lock()
            .ok()?
            .last()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FeedSink for MemorySink {
    async fn store(&self, bytes: &[u8]) -> Result<()> {
        self.writes
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink poisoned"))?
            .push(bytes.to_vec());
        Ok(())
    }
}
