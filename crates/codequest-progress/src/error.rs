//! Error types for progress persistence.

use std::path::PathBuf;

/// Errors that can occur while saving progress.
///
/// Loading never fails: an unreadable document is logged and replaced by
/// an empty record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Writing the progress file failed.
    #[error("failed to write progress file {path}: {source}")]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The record could not be encoded as JSON.
    #[error("failed to encode progress: {0}")]
    Serialization(#[from] serde_json::Error),
}
