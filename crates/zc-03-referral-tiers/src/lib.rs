//! # zc-03-referral-tiers
//!
//! Maps `(verified invites, total XP)` to a referral tier and multiplier.
//!
//! ## Rules
//!
//! - **Dual gate**: a tier is granted only when *both* thresholds hold.
//!   Resolution walks the table from the top tier down.
//! - **Progress**: 75% weight on XP, 25% on invites, each measured over the
//!   gap between the current tier and the next one and clamped to [0, 1].
//!   At the top tier progress is 100 and the next tier is `NextTier::Max`.
//!
//! The upward-only multiplier ratchet lives with the account in
//! `zc-05-points-ledger`; this crate only says what a tier *is*.

pub mod domain;

pub use domain::code::{generate_referral_code, is_well_formed_code, CODE_ALPHABET, CODE_PREFIX};
pub use domain::progress::{NextTier, Requirement, TierProgress};
pub use domain::tier::{Tier, TierTable, TierTableError};
