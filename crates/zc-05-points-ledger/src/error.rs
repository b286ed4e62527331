//! # Ledger Errors
//!
//! Every failure carries a stable machine-readable code (`code()`) for the
//! caller's response mapping. Duplicates and cooldowns are not errors; they
//! come back as ordinary outcomes.

use shared_types::{SocialPlatform, ValidationError};
use thiserror::Error;
use zc_01_ledger_store::StoreError;

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid wallet address: {value}")]
    InvalidAddress { value: String },

    #[error("Invalid transaction hash: {value}")]
    InvalidTxHash { value: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Task id is required")]
    MissingTaskId,

    #[error("An address cannot use its own referral code")]
    SelfReferral,

    #[error("{platform} identity {external_id} is linked to another address")]
    IdentityAlreadyLinked {
        platform: SocialPlatform,
        external_id: String,
    },

    #[error("Unknown referral code: {code}")]
    InvalidReferralCode { code: String },

    #[error("Mission not found: {id}")]
    MissionNotFound { id: String },

    #[error("Mission {id} is not active")]
    MissionInactive { id: u64 },

    #[error("Telegram account is not a member of the community group")]
    NotGroupMember,

    #[error("Identity verification rejected: {reason}")]
    VerificationRejected { reason: String },

    #[error("Upstream service unavailable: {message}")]
    Upstream { message: String },

    #[error("Storage failure: {0}")]
    Storage(StoreError),

    #[error("Ledger invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LedgerError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "INVALID_ADDRESS",
            Self::InvalidTxHash { .. } => "INVALID_TX_HASH",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::MissingTaskId => "MISSING_TASK_ID",
            Self::SelfReferral => "SELF_REFERRAL",
            Self::IdentityAlreadyLinked { .. } => "IDENTITY_ALREADY_LINKED",
            Self::InvalidReferralCode { .. } => "INVALID_REFERRAL_CODE",
            Self::MissionNotFound { .. } => "MISSION_NOT_FOUND",
            Self::MissionInactive { .. } => "MISSION_INACTIVE",
            Self::NotGroupMember => "NOT_GROUP_MEMBER",
            Self::VerificationRejected { .. } => "VERIFICATION_FAILED",
            Self::Upstream { .. } => "UPSTREAM_UNAVAILABLE",
            Self::Storage(e) if e.is_contention() => "BUSY",
            Self::Storage(_) => "STORAGE_FAILURE",
            Self::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            Self::Internal { .. } => "INTERNAL",
        }
    }

    /// Nothing was committed and the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Storage(_))
    }

    /// Caller input was rejected before any state was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. }
                | Self::InvalidTxHash { .. }
                | Self::InvalidArgument { .. }
                | Self::MissingTaskId
        )
    }

    /// The request was refused on its merits; nothing is wrong with the
    /// ledger itself.
    pub fn is_rejection(&self) -> bool {
        self.is_validation()
            || matches!(
                self,
                Self::SelfReferral
                    | Self::IdentityAlreadyLinked { .. }
                    | Self::InvalidReferralCode { .. }
                    | Self::MissionNotFound { .. }
                    | Self::MissionInactive { .. }
                    | Self::NotGroupMember
                    | Self::VerificationRejected { .. }
            )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

impl From<ValidationError> for LedgerError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::InvalidAddress { value } => Self::InvalidAddress { value },
            ValidationError::InvalidTxHash { value } => Self::InvalidTxHash { value },
            other => Self::InvalidArgument {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contention_is_busy_and_retryable() {
        let err = LedgerError::from(StoreError::LockTimeout { key: "acct/x".into() });
        assert_eq!(err.code(), "BUSY");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_commit_failure_is_storage_failure() {
        let err = LedgerError::from(StoreError::CommitFailed {
            message: "disk".into(),
        });
        assert_eq!(err.code(), "STORAGE_FAILURE");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_conflicts_are_not_retryable() {
        assert!(!LedgerError::SelfReferral.is_retryable());
        assert_eq!(LedgerError::SelfReferral.code(), "SELF_REFERRAL");
        assert_eq!(LedgerError::MissingTaskId.code(), "MISSING_TASK_ID");
    }

    #[test]
    fn test_validation_error_mapping() {
        let err = LedgerError::from(ValidationError::InvalidAddress {
            value: "0x12".into(),
        });
        assert_eq!(err.code(), "INVALID_ADDRESS");
        assert!(err.is_validation());
    }
}
