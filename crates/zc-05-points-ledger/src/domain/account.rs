//! Accounts and audit entries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Multiplier, SocialPlatform, TaskKind, WalletAddress};

/// Linked social identity as stored on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialIdentity {
    pub platform: SocialPlatform,
    pub external_id: String,
    pub handle: String,
    pub linked_at: DateTime<Utc>,
}

/// Per-address balance row.
///
/// `points` always equals the sum of the address's audit entries;
/// `audit_count` is the next audit sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: WalletAddress,
    pub points: u64,
    pub total_claims: u64,
    /// Only ever raised, except through an audited override.
    pub multiplier: Multiplier,
    pub referred_by: Option<WalletAddress>,
    pub has_pending_notification: bool,
    pub social: Vec<SocialIdentity>,
    /// Points earned as a referrer.
    pub referral_points: u64,
    pub audit_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(address: WalletAddress, now: DateTime<Utc>) -> Self {
        Self {
            address,
            points: 0,
            total_claims: 0,
            multiplier: Multiplier::ONE,
            referred_by: None,
            has_pending_notification: false,
            social: Vec::new(),
            referral_points: 0,
            audit_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn social_identity(&self, platform: SocialPlatform) -> Option<&SocialIdentity> {
        self.social.iter().find(|s| s.platform == platform)
    }
}

/// One immutable crediting decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub address: WalletAddress,
    /// Negative only for corrections.
    pub points_awarded: i64,
    pub task: TaskKind,
    pub task_type: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Faucet claim of one UTC day. Its presence is the cooldown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetClaimRecord {
    pub day: NaiveDate,
    pub points: u64,
    pub claimed_at: DateTime<Utc>,
}
