//! # Core Value Types
//!
//! ## Clusters
//!
//! - **Identity**: `WalletAddress`, `TxHash`
//! - **Rewards**: `Multiplier`
//! - **Activity**: `StreakType`, `SocialPlatform`, `ContractKind`,
//!   `StakeEventType`, `OnChainAction`, `MissionKind`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

// =============================================================================
// IDENTITY
// =============================================================================

fn is_prefixed_hex(value: &str, hex_len: usize) -> bool {
    let Some(body) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    else {
        return false;
    };
    body.len() == hex_len && body.bytes().all(|b| b.is_ascii_hexdigit())
}

/// An EVM wallet address, canonicalised to lowercase `0x` + 40 hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Validate and canonicalise an address.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if !is_prefixed_hex(trimmed, 40) {
            return Err(ValidationError::InvalidAddress {
                value: value.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction hash, canonicalised to lowercase `0x` + 64 hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if !is_prefixed_hex(trimmed, 64) {
            return Err(ValidationError::InvalidTxHash {
                value: value.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TxHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// REWARDS
// =============================================================================

/// Reward multiplier in basis points (10_000 = 1.0x).
///
/// Never below 1.0x. Applying it truncates, so fractional points are
/// always dropped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Multiplier(u32);

impl Multiplier {
    /// Basis points representing 1.0x.
    pub const BPS_SCALE: u32 = 10_000;

    /// The neutral multiplier.
    pub const ONE: Multiplier = Multiplier(Self::BPS_SCALE);

    pub fn from_bps(bps: u32) -> Result<Self, ValidationError> {
        if bps < Self::BPS_SCALE {
            return Err(ValidationError::InvalidMultiplier { bps });
        }
        Ok(Self(bps))
    }

    pub fn bps(self) -> u32 {
        self.0
    }

    /// `floor(base * multiplier)`.
    pub fn apply(self, base: u64) -> u64 {
        let scaled = u128::from(base) * u128::from(self.0) / u128::from(Self::BPS_SCALE);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(Self::BPS_SCALE)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for Multiplier {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_bps(value)
    }
}

impl From<Multiplier> for u32 {
    fn from(value: Multiplier) -> Self {
        value.0
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::BPS_SCALE;
        let frac = self.0 % Self::BPS_SCALE;
        if frac == 0 {
            write!(f, "{whole}.0x")
        } else {
            let digits = format!("{frac:04}");
            write!(f, "{whole}.{}x", digits.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// ACTIVITY
// =============================================================================

/// The two independently tracked daily streaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreakType {
    Faucet,
    Stake,
}

impl StreakType {
    pub const ALL: [StreakType; 2] = [StreakType::Faucet, StreakType::Stake];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Faucet => "FAUCET",
            Self::Stake => "STAKE",
        }
    }
}

impl fmt::Display for StreakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Social platforms that can be linked to a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocialPlatform {
    Twitter,
    Telegram,
}

impl SocialPlatform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "TWITTER",
            Self::Telegram => "TELEGRAM",
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialPlatform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TWITTER" | "X" => Ok(Self::Twitter),
            "TELEGRAM" => Ok(Self::Telegram),
            _ => Err(ValidationError::UnknownVariant {
                kind: "social platform",
                value: s.to_string(),
            }),
        }
    }
}

/// Which staking contract emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    /// Native ZUG staking.
    Native,
    /// Wrapped vZUG token staking.
    Token,
}

impl ContractKind {
    /// Display symbol of the staked asset.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Native => "ZUG",
            Self::Token => "vZUG",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Staking contract events the ledger understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeEventType {
    Staked,
    Compounded,
    RewardClaimed,
    Withdrawn,
    UnstakeRequested,
}

impl StakeEventType {
    /// Staked and Compounded earn points and advance the stake streak.
    /// Everything else is history only.
    pub fn is_qualifying(self) -> bool {
        matches!(self, Self::Staked | Self::Compounded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staked => "STAKED",
            Self::Compounded => "COMPOUNDED",
            Self::RewardClaimed => "REWARD_CLAIMED",
            Self::Withdrawn => "WITHDRAWN",
            Self::UnstakeRequested => "UNSTAKE_REQUESTED",
        }
    }
}

impl fmt::Display for StakeEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StakeEventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STAKED" => Ok(Self::Staked),
            "COMPOUNDED" => Ok(Self::Compounded),
            "REWARD_CLAIMED" | "REWARDCLAIMED" => Ok(Self::RewardClaimed),
            "WITHDRAWN" => Ok(Self::Withdrawn),
            "UNSTAKE_REQUESTED" | "UNSTAKEREQUESTED" => Ok(Self::UnstakeRequested),
            _ => Err(ValidationError::UnknownVariant {
                kind: "stake event",
                value: s.to_string(),
            }),
        }
    }
}

/// Non-staking on-chain actions with a fixed reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnChainAction {
    GovernanceVote,
}

impl OnChainAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GovernanceVote => "GOVERNANCE_VOTE",
        }
    }
}

/// Mission categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionKind {
    Social,
    Partner,
    Daily,
}

impl MissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Social => "SOCIAL",
            Self::Partner => "PARTNER",
            Self::Daily => "DAILY",
        }
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SOCIAL" => Ok(Self::Social),
            "PARTNER" => Ok(Self::Partner),
            "DAILY" => Ok(Self::Daily),
            _ => Err(ValidationError::UnknownVariant {
                kind: "mission kind",
                value: s.to_string(),
            }),
        }
    }
}
