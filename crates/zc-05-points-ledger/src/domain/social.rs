//! Social identity ownership and legacy points

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{SocialPlatform, WalletAddress};

/// Owner record for `(platform, external_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityOwner {
    pub address: WalletAddress,
    pub platform: SocialPlatform,
    pub external_id: String,
    pub handle: String,
    pub linked_at: DateTime<Utc>,
}

/// Pre-launch points waiting to be claimed by whoever links the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyPoints {
    pub external_id: String,
    pub points: u64,
    pub imported_at: DateTime<Utc>,
    pub claimed_by: Option<WalletAddress>,
}
