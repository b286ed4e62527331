//! # zc-05-points-ledger
//!
//! Exactly-once points crediting for the ZUG incentive program.
//!
//! ## Guarantees
//!
//! - Every balance change appends one audit row in the same transaction.
//!   `points` always equals the sum of the address's audit rows.
//! - A task with an idempotency key (tx hash, mission id, weekly date,
//!   referral pair...) credits at most once, no matter how many callers race.
//! - Multipliers only ratchet upward, except through an audited override.
//! - Events, cache invalidation and metrics happen strictly after commit.
//!
//! ## Layout
//!
//! ```text
//! service/    LedgerService operations, grouped by concern
//! ledger_txn  typed transaction: account, audit, marker and rank move together
//! domain/     persisted records and read views
//! ports/      outbound social verification
//! ```

pub mod config;
pub mod domain;
pub mod error;
mod ledger_txn;
pub mod ports;
pub mod service;
pub mod test_utils;

pub use config::{LedgerConfig, RewardSchedule};
pub use domain::account::{Account, AuditEntry, FaucetClaimRecord, SocialIdentity};
pub use domain::mission::{Mission, MissionDraft, MissionUpdate};
pub use domain::referral::ReferralLink;
pub use domain::social::{IdentityOwner, LegacyPoints};
pub use domain::stake::{StakeEvent, StakeRecord};
pub use domain::views::*;
pub use error::{LedgerError, LedgerResult};
pub use ports::{SocialVerifier, VerifiedIdentity, VerifierError};
pub use service::LedgerService;
