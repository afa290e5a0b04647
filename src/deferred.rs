//! Deferred events, kept between hook invocations.
//!
//! The queue is a JSON array of [`HookEvent`]s. It is rewritten atomically
//! (temp file in the same directory, then rename) so a crash mid-write leaves
//! the previous queue in place.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use openldap_reconciler::HookEvent;

#[derive(Debug, Clone)]
pub struct DeferredQueue {
    path: PathBuf,
}

impl DeferredQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Events waiting to be re-delivered, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Vec<HookEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read deferred events {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deferred events {}", self.path.display()))
    }

    /// Replace the queue with `events`. An empty queue removes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or removed.
    pub fn store(&self, events: &[HookEvent]) -> Result<()> {
        if events.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).with_context(|| {
                    format!("Failed to remove deferred events {}", self.path.display())
                })?;
            }
            return Ok(());
        }

        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let json = serde_json::to_string_pretty(events).context("Failed to encode deferred events")?;
        let mut file = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        file.write_all(json.as_bytes())
            .context("Failed to write deferred events")?;
        file.persist(&self.path)
            .with_context(|| format!("Failed to persist deferred events {}", self.path.display()))?;

        debug!(count = events.len(), path = %self.path.display(), "stored deferred events");
        Ok(())
    }
}
