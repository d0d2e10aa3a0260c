//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid artifact hash: {0}")]
    InvalidHash(String),

    #[error("invalid content identifier: {0}")]
    InvalidCid(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
