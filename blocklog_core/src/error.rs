//! Error types for the blocklog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for blocklog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied severity name is not one of the six levels
    #[error("Invalid log channel/level {0}")]
    InvalidSeverity(String),

    /// Sink write or file open failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Payload conversion to JSON failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
