//! Error types for the poster renamer.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the poster renamer.
#[derive(Error, Debug)]
pub enum Error {
    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Failed to hash {path}: {source}")]
    Hash {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Catalogue errors
    #[error("Failed to load media catalogue: {0}")]
    Catalogue(String),

    // Configuration errors
    #[error("Invalid border color: {0}")]
    InvalidBorderColor(String),

    #[error("Unknown border setting: {0}")]
    UnknownBorderSetting(String),

    #[error("Invalid config file: {0}")]
    InvalidConfig(String),

    // Cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("{path} has the same content as cached target {owner}")]
    DuplicateContent { path: String, owner: String },

    // Image errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    // Job errors
    #[error("Run failed during {stage}: {reason}")]
    RunFailed { stage: String, reason: String },

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
