//! Stake-sync errors

use shared_bus::QueueError;
use shared_types::{TxHash, WalletAddress};
use thiserror::Error;
use zc_05_points_ledger::LedgerError;

use crate::ports::OracleError;

/// Why a stake-sync job could not record its event.
#[derive(Debug, Error)]
pub enum StakeSyncError {
    /// The node has no receipt yet; the transaction may still be pending.
    #[error("Receipt not found for {tx_hash}")]
    ReceiptNotFound { tx_hash: TxHash },

    #[error("Transaction {tx_hash} reverted")]
    TransactionFailed { tx_hash: TxHash },

    #[error("Transaction target {to:?} is not a staking contract")]
    WrongContract { to: Option<WalletAddress> },

    #[error("No staking event in {tx_hash}")]
    EventNotFound { tx_hash: TxHash },

    #[error("Staking event belongs to {found}, not {expected}")]
    UserMismatch {
        expected: WalletAddress,
        found: WalletAddress,
    },

    #[error("Malformed log: {reason}")]
    MalformedLog { reason: String },

    #[error("Chain oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Stake job queue unavailable: {0}")]
    Queue(#[from] QueueError),

    #[error("Worker task failed: {message}")]
    Internal { message: String },
}

impl StakeSyncError {
    /// Failures worth another attempt. Everything about the receipt's
    /// content is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ReceiptNotFound { .. } => true,
            Self::Oracle(e) => e.is_retryable(),
            Self::Ledger(e) => e.is_retryable(),
            Self::Internal { .. } => true,
            _ => false,
        }
    }

    /// Short label for logs and dead-letter events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReceiptNotFound { .. } => "RECEIPT_NOT_FOUND",
            Self::TransactionFailed { .. } => "TRANSACTION_FAILED",
            Self::WrongContract { .. } => "WRONG_CONTRACT",
            Self::EventNotFound { .. } => "EVENT_NOT_FOUND",
            Self::UserMismatch { .. } => "USER_MISMATCH",
            Self::MalformedLog { .. } => "MALFORMED_LOG",
            Self::Oracle(_) => "UPSTREAM_UNAVAILABLE",
            Self::Ledger(e) => e.code(),
            Self::Queue(QueueError::Closed) => "QUEUE_CLOSED",
            Self::Queue(QueueError::Full) => "QUEUE_FULL",
            Self::Internal { .. } => "INTERNAL",
        }
    }
}

pub type StakeSyncResult<T> = Result<T, StakeSyncError>;
