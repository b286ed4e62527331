//! # Error Types
//!
//! Input validation errors shared by every crate that accepts raw strings.

use thiserror::Error;

/// Rejected input, raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Not a `0x`-prefixed 20-byte hex address.
    #[error("Invalid wallet address: {value}")]
    InvalidAddress { value: String },

    /// Not a `0x`-prefixed 32-byte hex hash.
    #[error("Invalid transaction hash: {value}")]
    InvalidTxHash { value: String },

    /// Multiplier below 1.0.
    #[error("Invalid multiplier: {bps} bps is below 1.0")]
    InvalidMultiplier { bps: u32 },

    /// Unknown enum spelling.
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
