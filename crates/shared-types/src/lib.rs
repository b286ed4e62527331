//! # Shared Types Crate
//!
//! Value types used across every ledger crate.
//!
//! ## Design Principles
//!
//! - **Canonical identity**: `WalletAddress` and `TxHash` are validated and
//!   lowercased at construction, so two spellings of the same wallet can
//!   never map to two accounts.
//! - **Structured taxonomy**: `TaskKind` carries its dedup key as data. The
//!   audit tag string is derived from it and never parsed back.
//! - **Fixed-point multipliers**: `Multiplier` is stored in basis points so
//!   that reward truncation is exact integer math.

pub mod clock;
pub mod entities;
pub mod errors;
pub mod task;

pub use clock::*;
pub use entities::*;
pub use errors::*;
pub use task::*;
