//! Error types for Salvador.

use thiserror::Error;

/// Library-level error type for Salvador operations.
#[derive(Error, Debug)]
pub enum SalvadorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool failed: {0}")]
    Tool(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Malformed tool output: {0}")]
    Parse(String),

    #[error("Thumbnail fetch failed: {0}")]
    Fetch(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl SalvadorError {
    /// Whether this error was caused by bad client input rather than a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SalvadorError::InvalidInput(_))
    }
}

/// Result type alias for Salvador operations.
pub type Result<T> = std::result::Result<T, SalvadorError>;
