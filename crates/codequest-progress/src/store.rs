//! Durable storage of the progress document.
//!
//! The whole [`ProgressRecord`] is one JSON document, read once at start-up
//! and rewritten after every change. Concurrent writers are not
//! coordinated: the last save wins.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use codequest_types::ProgressRecord;
use tracing::{debug, info, warn};

use crate::error::StoreError;

/// Where progress is read from and written to.
pub trait ProgressStore: Send + Sync {
    /// Read the stored record. Missing or unreadable data yields an empty
    /// record.
    fn load(&self) -> ProgressRecord;

    /// Replace the stored record.
    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError>;
}

/// A JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store progress at `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> ProgressRecord {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no progress file yet");
                return ProgressRecord::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable progress file, starting fresh");
                return ProgressRecord::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "corrupt progress file, starting fresh");
            ProgressRecord::default()
        })
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(record)?;

        // Replace atomically: sibling temp file, then rename.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        info!(
            path = %self.path.display(),
            completed = record.total_completed(),
            total_xp = record.profile.total_xp,
            "progress saved"
        );
        Ok(())
    }
}

/// Progress held in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<ProgressRecord>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `record`.
    pub fn with_record(record: ProgressRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> ProgressRecord {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        record.clone_into(&mut self.record.lock().unwrap_or_else(PoisonError::into_inner));
        Ok(())
    }
}
