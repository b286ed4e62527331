//! Operation outcomes and read views

use serde::{Deserialize, Serialize};
use shared_types::{Multiplier, WalletAddress};
use zc_03_referral_tiers::TierProgress;

use crate::domain::mission::Mission;

/// Result of a generic credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditOutcome {
    /// `false` when the event had already been credited.
    pub credited: bool,
    pub final_amount: i64,
    pub new_balance: u64,
}

/// Result of a faucet claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetClaimOutcome {
    pub allowed: bool,
    /// Seconds to the next UTC midnight when refused.
    pub cooldown_seconds_remaining: Option<u64>,
    pub points_awarded: Option<u64>,
    pub faucet_streak: u32,
    pub referral_bonus_paid: bool,
    pub new_balance: u64,
}

/// Result of recording a stake event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeOutcome {
    pub points_awarded: u64,
    pub credited: bool,
    /// `false` when the transaction was already in history.
    pub recorded: bool,
    pub stake_streak: Option<u32>,
}

/// Result of a mission completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionOutcome {
    pub credited: bool,
    pub points_awarded: u64,
    pub new_balance: u64,
}

/// Result of linking a social identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinkOutcome {
    pub success: bool,
    pub is_new_connection: bool,
    pub bonus_awarded: u64,
    pub legacy_points_claimed: u64,
}

/// Result of presenting a referral code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterOutcome {
    Registered { referrer: WalletAddress },
    /// The referee already had a link; nothing changed.
    AlreadyLinked { referrer: WalletAddress },
}

/// Result of a referral bonus distribution attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusOutcome {
    pub paid: bool,
    pub referee_points: u64,
    pub referrer_points: u64,
}

/// Result of a weekly bonus check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyBonusOutcome {
    pub awarded: bool,
    pub points: u64,
    /// `ELIGIBLE`, `STREAK_TOO_SHORT`, `STALE` or `ALREADY_AWARDED`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub address: WalletAddress,
    pub points: u64,
    pub total_claims: u64,
    /// 0 for unknown addresses.
    pub rank: u64,
    pub multiplier: Multiplier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub address: WalletAddress,
    pub points: u64,
    pub total_claims: u64,
    pub rank: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralStats {
    pub total_referrals: u64,
    pub verified_referrals: u64,
    pub active_stakers: u64,
    pub points_earned: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCount {
    pub current: u64,
    pub required: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierView {
    pub name: String,
    pub multiplier: Multiplier,
    pub next_tier: String,
    pub progress_percent: u8,
    pub missing_requirements: String,
    pub invites: ProgressCount,
    pub xp: ProgressCount,
}

impl TierView {
    pub(crate) fn from_progress(progress: &TierProgress, invites: u64, xp: u64) -> Self {
        let (invites_required, xp_required) = match &progress.next {
            zc_03_referral_tiers::NextTier::Tier(next) => (next.min_verified_invites, next.min_xp),
            zc_03_referral_tiers::NextTier::Max => {
                (progress.tier.min_verified_invites, progress.tier.min_xp)
            }
        };
        Self {
            name: progress.tier.name.clone(),
            multiplier: progress.tier.multiplier,
            next_tier: progress.next.name().to_string(),
            progress_percent: progress.progress_percent,
            missing_requirements: progress.missing_summary(),
            invites: ProgressCount {
                current: invites,
                required: invites_required,
            },
            xp: ProgressCount {
                current: xp,
                required: xp_required,
            },
        }
    }
}

/// Everything the referral page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralOverview {
    pub code: String,
    pub link: String,
    pub stats: ReferralStats,
    pub tier: TierView,
    /// Multiplier stored on the account after the ratchet.
    pub multiplier: Multiplier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_users: u64,
    pub total_points: u64,
    /// Number of audit entries.
    pub total_activity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionStatusEntry {
    pub mission: Mission,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionStatus {
    pub missions: Vec<MissionStatusEntry>,
    pub faucet_streak: u32,
    pub stake_streak: u32,
    pub has_pending_notification: bool,
    pub weekly_bonus: WeeklyBonusOutcome,
}

/// Audit sum versus stored balance for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub address: WalletAddress,
    pub stored_points: u64,
    pub audit_sum: i64,
    pub stored_audit_count: u64,
    pub audit_entries: u64,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        i64::try_from(self.stored_points).ok() == Some(self.audit_sum)
            && self.stored_audit_count == self.audit_entries
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub accounts_checked: u64,
    pub mismatches: Vec<ReconcileReport>,
}
