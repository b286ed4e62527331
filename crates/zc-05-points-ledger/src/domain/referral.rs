//! Referral links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ContractKind, WalletAddress};

/// Referee → referrer link. Created once, never re-pointed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralLink {
    pub referrer: WalletAddress,
    pub referee: WalletAddress,
    pub code: String,
    pub registered_at: DateTime<Utc>,
    pub faucet_bonus_paid: bool,
    pub zug_stake_bonus_paid: bool,
    pub vzug_stake_bonus_paid: bool,
}

impl ReferralLink {
    pub fn new(
        referrer: WalletAddress,
        referee: WalletAddress,
        code: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            referrer,
            referee,
            code,
            registered_at: now,
            faucet_bonus_paid: false,
            zug_stake_bonus_paid: false,
            vzug_stake_bonus_paid: false,
        }
    }

    pub fn stake_bonus_paid(&self, contract: ContractKind) -> bool {
        match contract {
            ContractKind::Native => self.zug_stake_bonus_paid,
            ContractKind::Token => self.vzug_stake_bonus_paid,
        }
    }

    pub fn mark_stake_bonus_paid(&mut self, contract: ContractKind) {
        match contract {
            ContractKind::Native => self.zug_stake_bonus_paid = true,
            ContractKind::Token => self.vzug_stake_bonus_paid = true,
        }
    }

    /// Counts toward the referrer's tier: any of the referee's bonuses
    /// has been settled.
    pub fn is_verified(&self) -> bool {
        self.faucet_bonus_paid || self.is_active_staker()
    }

    pub fn is_active_staker(&self) -> bool {
        self.zug_stake_bonus_paid || self.vzug_stake_bonus_paid
    }
}
