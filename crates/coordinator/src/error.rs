//! Error types for coordinator calls.

use thiserror::Error;

/// Coordinator client error type.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The call could not be completed (connect, timeout, body read).
    #[error("coordinator transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The coordinator answered outside the 2xx range.
    #[error("coordinator returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not match the expected JSON shape.
    #[error("coordinator protocol error: {0}")]
    Protocol(String),

    /// The configured base URL cannot carry the API path segments.
    #[error("invalid coordinator url: {0}")]
    InvalidUrl(String),
}

/// Result type alias for coordinator operations.
pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;
