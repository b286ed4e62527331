//! Storage error types

use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Waited too long for another transaction to release a key
    #[error("Lock wait timed out on key {key}")]
    LockTimeout { key: String },

    /// Engine-reported conflict or deadlock
    #[error("Transaction busy: {message}")]
    Busy { message: String },

    /// Commit did not complete; nothing was applied
    #[error("Commit failed: {message}")]
    CommitFailed { message: String },

    /// Underlying I/O failure
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Record could not be encoded or decoded
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl StoreError {
    /// Contention errors: the whole transaction can be retried as-is.
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::LockTimeout { .. } | Self::Busy { .. })
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Printable form of a binary key for error messages.
pub(crate) fn key_display(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
