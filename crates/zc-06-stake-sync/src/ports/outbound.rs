//! # Outbound Ports
//!
//! The worker reads chain state only through `ChainOracle`. Receipts are
//! fetched before any ledger transaction is opened.

use async_trait::async_trait;
use shared_types::TxHash;
use thiserror::Error;

use crate::domain::receipt::TxReceipt;

/// Chain access errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// Node unreachable, timed out or returned an RPC error.
    #[error("Chain node unavailable: {message}")]
    Unavailable { message: String },

    /// The node answered with something that is not a receipt.
    #[error("Invalid receipt response: {message}")]
    InvalidResponse { message: String },
}

impl OracleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Read-only view of the chain.
#[async_trait]
pub trait ChainOracle: Send + Sync {
    /// Receipt of a mined transaction, `None` while unknown or pending.
    async fn transaction_receipt(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>, OracleError>;
}
