//! File-backed alert history
//!
//! The history lives in one JSON document. Every save copies the current
//! document to `<file>.backup` first, then replaces the primary through a
//! temporary sibling and a rename, so a reader never sees a half-written
//! file. The store does no locking of its own.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{AlertHistory, HistoryError};

/// File name used inside a data directory
pub const HISTORY_FILE_NAME: &str = "alert-history.json";

/// Persists [`AlertHistory`] to disk
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store backed by an explicit file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at `<data_dir>/alert-history.json`
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join(HISTORY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".backup")
    }

    fn temp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".tmp")
    }

    /// Load the history, or an empty one if the file does not exist yet
    pub fn load(&self) -> Result<AlertHistory, HistoryError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AlertHistory::new()),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        serde_json::from_slice(&data).map_err(|e| HistoryError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Replace the persisted history with `history`
    pub fn save(&self, history: &AlertHistory) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
            }
        }

        let data = serde_json::to_vec_pretty(history)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;

        // Single generation: the backup is overwritten on each save
        match fs::copy(&self.path, self.backup_path()) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(&self.backup_path(), e)),
        }

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path).map_err(|e| self.io_error(&temp_path, e))?;
        file.write_all(&data)
            .and_then(|_| file.sync_all())
            .map_err(|e| self.io_error(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            cells = history.len(),
            "Alert history saved"
        );

        Ok(())
    }

    /// Load the previous generation kept in the backup file, if any
    pub fn load_backup(&self) -> Result<Option<AlertHistory>, HistoryError> {
        let backup_path = self.backup_path();
        let data = match fs::read(&backup_path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&backup_path, e)),
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| HistoryError::Corrupt {
                path: backup_path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
