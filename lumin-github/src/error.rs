//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// REST error reported through octocrab
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Network failure before a response arrived
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The GraphQL envelope carried errors
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// The requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Rate limit exceeded
    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    /// Response did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from the core library
    #[error(transparent)]
    Core(#[from] lumin_core::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for "does not exist" as opposed to a failed request
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Classify an octocrab failure by the message GitHub returned
pub(crate) fn from_octocrab(err: octocrab::Error, what: impl Into<String>) -> Error {
    match err {
        octocrab::Error::GitHub { source, backtrace } => {
            let message = source.message.to_lowercase();
            if message.contains("not found") {
                Error::NotFound(what.into())
            } else if message.contains("bad credentials") {
                Error::Auth("Invalid GitHub token".to_string())
            } else if message.contains("rate limit") {
                Error::RateLimited(source.message)
            } else {
                Error::Api(octocrab::Error::GitHub { source, backtrace })
            }
        }
        other => Error::Api(other),
    }
}

/// Classify a non-2xx status from a raw HTTP call
pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Error {
    match status.as_u16() {
        401 => Error::Auth(body),
        404 => Error::NotFound(body),
        403 | 429 if body.to_lowercase().contains("rate limit") => Error::RateLimited(body),
        code => Error::Status { status: code, body },
    }
}
