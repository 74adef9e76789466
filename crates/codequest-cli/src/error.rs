//! Error types for the `codequest` binary.
//!
//! [`CliError`] wraps every failure that stops the program. Rejected
//! answers and failed saves are not errors: the player sees them and keeps
//! playing.

/// Top-level error for the `codequest` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: codequest_engine::config::ConfigError,
    },

    /// The level catalog could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: codequest_catalog::CatalogError,
    },

    /// Reading input or writing to the terminal failed.
    #[error("terminal I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
