//! Viewing-history log
//!
//! A session-durable JSON log of watched items, stored under the platform
//! data dir. This crate never writes records during playback; the log is
//! produced elsewhere and consumed here by the stats engine.

pub mod stats;

pub use stats::{aggregate, CachedStats, ViewingStats};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::WatchedItem;

/// File-backed store for the watch log
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Default log location (~/.local/share/streamgate/history.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("streamgate").join("history.json"))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at the default location
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path().context("could not determine data directory")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records; a missing file is an empty log
    pub fn load(&self) -> Result<Vec<WatchedItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&text).context("failed to parse history log")
    }

    /// Persist the full log, creating parent directories as needed
    pub fn save(&self, items: &[WatchedItem]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
