//! Stake-sync domain: receipts, event ABI and decoding

pub mod abi;
pub mod contracts;
pub mod decode;
pub mod receipt;
