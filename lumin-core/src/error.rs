//! Error types for LUMIN automation

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input file is well-formed but does not describe valid entities
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
