//! Transaction receipts as the worker sees them

use shared_types::{TxHash, WalletAddress};

/// One EVM log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract.
    pub address: WalletAddress,
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
}

/// Mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    /// `true` for status `0x1`.
    pub success: bool,
    /// Call target, `None` for contract creation.
    pub to: Option<WalletAddress>,
    pub block_number: u64,
    pub logs: Vec<Log>,
}
