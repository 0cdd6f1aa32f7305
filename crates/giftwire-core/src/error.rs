//! Error types for Giftwire core

use thiserror::Error;

/// Errors surfaced by a remote register backend
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The session connection is gone or the request never got a reply
    #[error("register connection failed: {0}")]
    Connection(String),

    /// A register value could not be encoded or decoded
    #[error("register value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The change notification stream for a key has shut down
    #[error("watch stream closed for key {0}")]
    WatchClosed(String),
}

/// Result type for register operations
pub type RegisterResult<T> = Result<T, RegisterError>;
