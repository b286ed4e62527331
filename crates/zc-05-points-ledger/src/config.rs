//! Ledger configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::{ContractKind, OnChainAction, SocialPlatform, TaskKind};
use zc_02_streak_engine::DEFAULT_CYCLE_LENGTH;
use zc_03_referral_tiers::TierTable;

/// Base point amounts per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub faucet_claim: u64,
    pub native_stake: u64,
    pub token_stake: u64,
    pub governance_vote: u64,
    pub twitter_connect: u64,
    pub telegram_connect: u64,
    pub weekly_streak_bonus: u64,
    pub referral_welcome: u64,
    pub referral_reward_faucet: u64,
    /// Referrer reward for a referee's first stake. 0 disables the credit;
    /// the bonus flag still flips.
    pub referral_reward_stake: u64,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            faucet_claim: 25,
            native_stake: 25,
            token_stake: 20,
            governance_vote: 15,
            twitter_connect: 100,
            telegram_connect: 150,
            weekly_streak_bonus: 1_000,
            referral_welcome: 50,
            referral_reward_faucet: 100,
            referral_reward_stake: 0,
        }
    }
}

impl RewardSchedule {
    pub fn stake(&self, contract: ContractKind) -> u64 {
        match contract {
            ContractKind::Native => self.native_stake,
            ContractKind::Token => self.token_stake,
        }
    }

    pub fn on_chain(&self, action: OnChainAction) -> u64 {
        match action {
            OnChainAction::GovernanceVote => self.governance_vote,
        }
    }

    pub fn social(&self, platform: SocialPlatform) -> u64 {
        match platform {
            SocialPlatform::Twitter => self.twitter_connect,
            SocialPlatform::Telegram => self.telegram_connect,
        }
    }

    /// Configured base for kinds with a fixed amount. Missions, legacy
    /// claims and admin kinds carry their amount separately.
    pub fn base_for(&self, task: &TaskKind) -> Option<u64> {
        match task {
            TaskKind::FaucetClaim => Some(self.faucet_claim),
            TaskKind::Stake { contract, .. } => Some(self.stake(*contract)),
            TaskKind::OnChain { action, .. } => Some(self.on_chain(*action)),
            TaskKind::SocialConnect { platform } => Some(self.social(*platform)),
            TaskKind::ReferralWelcome => Some(self.referral_welcome),
            TaskKind::ReferralRewardFaucet { .. } => Some(self.referral_reward_faucet),
            TaskKind::ReferralRewardStake { .. } => Some(self.referral_reward_stake),
            TaskKind::WeeklyStreakBonus { .. } => Some(self.weekly_streak_bonus),
            TaskKind::Mission { .. }
            | TaskKind::LegacyClaim
            | TaskKind::Correction
            | TaskKind::MultiplierOverride => None,
        }
    }
}

/// Ledger service configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub rewards: RewardSchedule,
    pub tiers: TierTable,
    /// Streak length after which the counter wraps to 1.
    pub streak_cycle_length: u32,
    /// Minimum of both streaks required for the weekly bonus.
    pub weekly_bonus_threshold: u32,
    /// Whole-transaction retries after lock contention.
    pub max_txn_retries: u32,
    pub retry_backoff: Duration,
    /// Origin used for referral links.
    pub referral_origin: String,
    pub profile_ttl: Duration,
    pub stats_ttl: Duration,
    pub max_leaderboard: usize,
    pub max_history: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rewards: RewardSchedule::default(),
            tiers: TierTable::default(),
            streak_cycle_length: DEFAULT_CYCLE_LENGTH,
            weekly_bonus_threshold: DEFAULT_CYCLE_LENGTH,
            max_txn_retries: 8,
            retry_backoff: Duration::from_millis(5),
            referral_origin: "https://zug.network".to_string(),
            profile_ttl: Duration::from_secs(60),
            stats_ttl: Duration::from_secs(300),
            max_leaderboard: 100,
            max_history: 100,
        }
    }
}

impl LedgerConfig {
    /// Tight retry timing for tests.
    pub fn for_testing() -> Self {
        Self {
            max_txn_retries: 50,
            retry_backoff: Duration::from_millis(1),
            ..Self::default()
        }
    }

    pub fn referral_link(&self, code: &str) -> String {
        format!("{}/?ref={}", self.referral_origin.trim_end_matches('/'), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TxHash;

    #[test]
    fn test_default_schedule() {
        let rewards = RewardSchedule::default();
        let tx = TxHash::parse(&format!("0x{}", "a".repeat(64))).unwrap();
        assert_eq!(
            rewards.base_for(&TaskKind::Stake {
                contract: ContractKind::Token,
                tx
            }),
            Some(20)
        );
        assert_eq!(rewards.base_for(&TaskKind::FaucetClaim), Some(25));
        assert_eq!(rewards.base_for(&TaskKind::Correction), None);
    }

    #[test]
    fn test_referral_link_format() {
        let config = LedgerConfig {
            referral_origin: "https://zug.network/".into(),
            ..LedgerConfig::default()
        };
        assert_eq!(
            config.referral_link("ZUG-ABCD2345"),
            "https://zug.network/?ref=ZUG-ABCD2345"
        );
    }
}
