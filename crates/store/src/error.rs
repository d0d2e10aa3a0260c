//! Error types for store operations.

use thiserror::Error;

/// Store adapter error type.
///
/// `Startup` and `Operation` carry the full command line, exit code, and
/// both output streams: they signal broken infrastructure assumptions
/// (missing or misbehaving store binary), not ordinary user errors, and are
/// never retried automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "store repository failed to start\ncommand: {command:?}\nexit code: {code}\nstdout: {stdout}\nstderr: {stderr}"
    )]
    Startup {
        command: Vec<String>,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error(
        "store command failed\ncommand: {command:?}\nexit code: {code}\nstdout: {stdout}\nstderr: {stderr}"
    )]
    Operation {
        command: Vec<String>,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("store returned an invalid cid: {0}")]
    InvalidCid(#[from] silo_core::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
