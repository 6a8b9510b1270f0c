//! Error types for the engine facade and the command-line client.

use thiserror::Error;

use crate::domain::StorageError;

/// Client-facing errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The realtime channel could not be opened
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An argument failed validation (empty session key, unknown role, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Durable storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The engine task has already shut down
    #[error("Engine has stopped")]
    EngineStopped,

    /// An out-of-band ping was requested while no session is active
    #[error("Latency probe is not running")]
    ProbeNotRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::domain::ValueObjectError> for ClientError {
    fn from(error: crate::domain::ValueObjectError) -> Self {
        ClientError::InvalidArgument(error.to_string())
    }
}
