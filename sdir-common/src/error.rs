//! Common error types for the student directory service

use thiserror::Error;

/// Common result type for directory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the directory service
#[derive(Error, Debug)]
pub enum Error {
    /// Requested record or identity absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// External collaborator (Record Store / Identity Provider / Vision
    /// Matcher) unreachable or rejected the call
    #[error("{service} error: {message}")]
    External { service: &'static str, message: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an external-service failure
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Error::External {
            service,
            message: message.into(),
        }
    }
}
