//! Cache keys

use std::fmt;

use shared_types::WalletAddress;

/// A cacheable read view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Profile(WalletAddress),
    ReferralStats(WalletAddress),
    StakingHistory(WalletAddress),
    Leaderboard(usize),
    GlobalStats,
}

impl CacheKey {
    /// Address owning this view, if it is per-address.
    pub fn address(&self) -> Option<&WalletAddress> {
        match self {
            Self::Profile(a) | Self::ReferralStats(a) | Self::StakingHistory(a) => Some(a),
            Self::Leaderboard(_) | Self::GlobalStats => None,
        }
    }

    /// Views derived from every account.
    pub fn is_aggregate(&self) -> bool {
        self.address().is_none()
    }

    /// Metric label.
    pub fn view(&self) -> &'static str {
        match self {
            Self::Profile(_) => "profile",
            Self::ReferralStats(_) => "referral_stats",
            Self::StakingHistory(_) => "staking_history",
            Self::Leaderboard(_) => "leaderboard",
            Self::GlobalStats => "global_stats",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile(a) => write!(f, "profile:{a}"),
            Self::ReferralStats(a) => write!(f, "referral_stats:{a}"),
            Self::StakingHistory(a) => write!(f, "staking_history:{a}"),
            Self::Leaderboard(limit) => write!(f, "leaderboard:{limit}"),
            Self::GlobalStats => write!(f, "global_stats"),
        }
    }
}
