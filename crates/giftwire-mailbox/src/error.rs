//! Error types for the mailbox layer

use giftwire_core::RegisterError;
use thiserror::Error;

/// Errors from mailbox operations
#[derive(Debug, Error)]
pub enum MailboxError {
    /// Optimistic write lost to concurrent writers on every attempt
    #[error("write conflict persisted after {attempts} attempts")]
    WriteConflict { attempts: u32 },

    /// The target box is not open for sends
    #[error("gift box is closed")]
    BoxClosed,

    /// The register itself failed
    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    /// A box value could not be encoded or decoded
    #[error("gift box serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for mailbox operations
pub type MailboxResult<T> = Result<T, MailboxError>;
