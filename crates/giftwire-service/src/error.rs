//! Error types for the gifting service

use giftwire_core::RegisterError;
use giftwire_mailbox::MailboxError;
use thiserror::Error;

use crate::acceptance::GiftRefusal;

/// Errors surfaced by [`GiftService`](crate::GiftService) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The recipient's box refused the gift. Retrying without changing the
    /// gift or waiting for the recipient to reconfigure will refuse again.
    #[error("gift refused: {0}")]
    Refused(#[from] GiftRefusal),

    /// The box kept changing under us and the retry budget ran out. The
    /// operation took no effect and may be retried.
    #[error("write conflict persisted after {attempts} attempts")]
    WriteConflict { attempts: u32 },

    /// The underlying register failed.
    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    /// A box value could not be encoded or decoded.
    #[error("gift box serialization failed: {0}")]
    Serialization(String),
}

impl From<MailboxError> for ServiceError {
    fn from(error: MailboxError) -> Self {
        match error {
            MailboxError::WriteConflict { attempts } => ServiceError::WriteConflict { attempts },
            MailboxError::BoxClosed => ServiceError::Refused(GiftRefusal::BoxClosed),
            MailboxError::Register(e) => ServiceError::Register(e),
            MailboxError::Serialization(e) => ServiceError::Serialization(e.to_string()),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
