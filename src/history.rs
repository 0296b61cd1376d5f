//! Persistent history log
//!
//! The session history is written as JSON when the calculator exits and
//! read back on start, so earlier calculations can still be listed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::calc::HistoryEntry;
use crate::{Error, Result};

/// On-disk layout of the history log
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    saved_at: DateTime<Local>,
    operations: Vec<HistoryEntry>,
}

/// JSON file holding past operations
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved operations, oldest first
    ///
    /// A missing log is empty. A malformed log is logged and treated as empty.
    #[must_use]
    pub fn load(&self) -> Vec<HistoryEntry> {
        if !self.path.exists() {
            return Vec::new();
        }

        match self.try_load() {
            Ok(entries) => {
                tracing::info!(
                    path = %self.path.display(),
                    count = entries.len(),
                    "loaded history"
                );
                entries
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load history, starting empty"
                );
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<HistoryEntry>> {
        let content = std::fs::read_to_string(&self.path)?;
        let file: HistoryFile = serde_json::from_str(&content)?;
        Ok(file.operations)
    }

    /// Write the operations, replacing any previous log
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the write fails
    pub fn save<'a>(&self, entries: impl IntoIterator<Item = &'a HistoryEntry>) -> Result<()> {
        let file = HistoryFile {
            saved_at: Local::now(),
            operations: entries.into_iter().cloned().collect(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::History(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, json)?;

        tracing::info!(
            path = %self.path.display(),
            count = file.operations.len(),
            "saved history"
        );
        Ok(())
    }
}
