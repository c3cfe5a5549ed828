//! Error types for the catalog.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the catalog library.
#[derive(Error, Debug)]
pub enum Error {
    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    // Catalog errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Episode not found: {0}")]
    EpisodeNotFound(i64),

    #[error("Series not found: {0}")]
    SeriesNotFound(i64),

    // Prober errors
    #[error("Probe failed for {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Probe timed out after {secs}s: {path}")]
    ProbeTimeout { path: String, secs: u64 },

    // Config errors
    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a probe failure for a file.
    pub fn probe_failed<S: Into<String>>(path: &std::path::Path, reason: S) -> Self {
        Error::ProbeFailed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}
