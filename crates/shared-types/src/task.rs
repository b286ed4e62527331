//! # Task Taxonomy
//!
//! Every crediting decision is described by a `TaskKind`. Date- and
//! transaction-scoped kinds carry their scope as structured data; the audit
//! tag (`WEEKLY_STREAK_BONUS_2024-05-01`) and the dedup key are both derived
//! from it, so the two can never drift apart.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::{
    ContractKind, MissionKind, OnChainAction, SocialPlatform, TxHash, WalletAddress,
};

/// What a ledger credit is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Daily faucet claim. Gated by cooldown, not by dedup key.
    FaucetClaim,
    /// Qualifying stake event (Staked / Compounded).
    Stake { contract: ContractKind, tx: TxHash },
    /// Other rewarded on-chain action.
    OnChain { action: OnChainAction, tx: TxHash },
    /// Mission from the registry.
    Mission { kind: MissionKind, id: u64 },
    /// First link of a social identity.
    SocialConnect { platform: SocialPlatform },
    /// Imported pre-launch points.
    LegacyClaim,
    /// Referee side of a referral.
    ReferralWelcome,
    /// Referrer reward for a referee's first faucet claim.
    ReferralRewardFaucet { referee: WalletAddress },
    /// Referrer reward for a referee's first stake on a contract.
    ReferralRewardStake {
        referee: WalletAddress,
        contract: ContractKind,
    },
    /// Weekly streak bonus for a UTC day.
    WeeklyStreakBonus { day: NaiveDate },
    /// Administrative balance correction (may be negative).
    Correction,
    /// Administrative multiplier change (0 points).
    MultiplierOverride,
}

impl TaskKind {
    /// Audit tag string.
    pub fn tag(&self) -> String {
        match self {
            Self::FaucetClaim => "FAUCET_CLAIM".to_string(),
            Self::Stake {
                contract: ContractKind::Native,
                ..
            } => "NATIVE_STAKE".to_string(),
            Self::Stake {
                contract: ContractKind::Token,
                ..
            } => "VZUG_WRAP".to_string(),
            Self::OnChain { action, .. } => action.as_str().to_string(),
            Self::Mission { kind, id } => format!("MISSION_{}_{}", kind.as_str(), id),
            Self::SocialConnect { platform } => {
                format!("MISSION_SOCIAL_CONNECT_{}", platform.as_str())
            }
            Self::LegacyClaim => "LEGACY_CLAIM".to_string(),
            Self::ReferralWelcome => "REFERRAL_WELCOME".to_string(),
            Self::ReferralRewardFaucet { .. } => "REFERRAL_REWARD_FAUCET".to_string(),
            Self::ReferralRewardStake { .. } => "REFERRAL_REWARD_STAKE".to_string(),
            Self::WeeklyStreakBonus { day } => {
                format!("WEEKLY_STREAK_BONUS_{}", day.format("%Y-%m-%d"))
            }
            Self::Correction => "CORRECTION".to_string(),
            Self::MultiplierOverride => "MULTIPLIER_OVERRIDE".to_string(),
        }
    }

    /// Per-address dedup key for one-shot kinds. `None` for recurring kinds.
    ///
    /// Stake and on-chain kinds share the `tx/` namespace: one transaction
    /// credits at most once, whatever it is classified as.
    pub fn idempotency_key(&self) -> Option<String> {
        match self {
            Self::FaucetClaim | Self::Correction | Self::MultiplierOverride => None,
            Self::Stake { tx, .. } | Self::OnChain { tx, .. } => Some(format!("tx/{tx}")),
            Self::Mission { id, .. } => Some(format!("mission/{id}")),
            Self::SocialConnect { platform } => Some(format!("social/{}", platform.as_str())),
            Self::LegacyClaim => Some("legacy".to_string()),
            Self::ReferralWelcome => Some("referral/welcome".to_string()),
            Self::ReferralRewardFaucet { referee } => Some(format!("referral/faucet/{referee}")),
            Self::ReferralRewardStake { referee, contract } => {
                Some(format!("referral/stake/{}/{referee}", contract.symbol()))
            }
            Self::WeeklyStreakBonus { day } => Some(format!("weekly/{}", day.format("%Y-%m-%d"))),
        }
    }

    /// Whether the account multiplier applies. Bonus kinds credit the
    /// literal configured amount.
    pub fn is_boostable(&self) -> bool {
        matches!(
            self,
            Self::FaucetClaim | Self::Stake { .. } | Self::OnChain { .. } | Self::Mission { .. }
        )
    }

    /// Low-cardinality label for metrics: date and id suffixes dropped.
    pub fn family(&self) -> &'static str {
        match self {
            Self::FaucetClaim => "FAUCET_CLAIM",
            Self::Stake {
                contract: ContractKind::Native,
                ..
            } => "NATIVE_STAKE",
            Self::Stake { .. } => "VZUG_WRAP",
            Self::OnChain { action, .. } => action.as_str(),
            Self::Mission { .. } => "MISSION",
            Self::SocialConnect { .. } => "MISSION_SOCIAL_CONNECT",
            Self::LegacyClaim => "LEGACY_CLAIM",
            Self::ReferralWelcome => "REFERRAL_WELCOME",
            Self::ReferralRewardFaucet { .. } => "REFERRAL_REWARD_FAUCET",
            Self::ReferralRewardStake { .. } => "REFERRAL_REWARD_STAKE",
            Self::WeeklyStreakBonus { .. } => "WEEKLY_STREAK_BONUS",
            Self::Correction => "CORRECTION",
            Self::MultiplierOverride => "MULTIPLIER_OVERRIDE",
        }
    }

    /// Only corrections may carry a negative amount.
    pub fn allows_negative(&self) -> bool {
        matches!(self, Self::Correction)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}
