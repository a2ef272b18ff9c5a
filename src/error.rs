//! Error types for breakpoint override
//!
//! The breakpoint operations themselves never fail; these errors come from
//! the edges: persisted configuration, file input and the admin surface.

use thiserror::Error;

/// Result type alias for fallible operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur around the breakpoint core
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Reading or writing the persisted record failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A persisted record or input document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Caller lacks the capability required by the settings page
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageError(err.to_string())
    }
}
