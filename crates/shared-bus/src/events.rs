//! # Ledger Events
//!
//! Everything the ledger announces after a successful commit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ContractKind, SocialPlatform, StakeEventType, StreakType, TxHash, WalletAddress};
use uuid::Uuid;

/// All events that can be published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // CREDITS
    // =========================================================================
    /// An audit row was committed together with a balance change.
    PointsCredited {
        event_id: Uuid,
        address: WalletAddress,
        task: String,
        points: i64,
        new_balance: u64,
        at: DateTime<Utc>,
    },

    /// A weekly streak bonus was awarded for `day`.
    WeeklyBonusAwarded {
        address: WalletAddress,
        day: NaiveDate,
        points: u64,
    },

    // =========================================================================
    // STREAKS
    // =========================================================================
    /// A streak counter moved (or restarted).
    StreakAdvanced {
        address: WalletAddress,
        streak: StreakType,
        current: u32,
        day: NaiveDate,
    },

    // =========================================================================
    // REFERRALS
    // =========================================================================
    /// A referee was linked to a referrer (no points yet).
    ReferralRegistered {
        referrer: WalletAddress,
        referee: WalletAddress,
        code: String,
    },

    /// The referee's first qualifying action paid the referral pair.
    ReferralBonusPaid {
        referrer: WalletAddress,
        referee: WalletAddress,
        referee_points: u64,
        referrer_points: u64,
    },

    // =========================================================================
    // SOCIAL
    // =========================================================================
    /// A social identity was linked for the first time.
    SocialLinked {
        address: WalletAddress,
        platform: SocialPlatform,
        external_id: String,
    },

    // =========================================================================
    // STAKING
    // =========================================================================
    /// A stake transaction was recorded in history.
    StakeRecorded {
        address: WalletAddress,
        tx_hash: TxHash,
        event_type: StakeEventType,
        contract: ContractKind,
        points: u64,
    },

    /// A stake-sync job gave up.
    StakeJobFailed {
        address: WalletAddress,
        tx_hash: TxHash,
        attempts: u32,
        reason: String,
        retryable: bool,
    },
}

impl LedgerEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::PointsCredited { .. } | Self::WeeklyBonusAwarded { .. } => EventTopic::Credits,
            Self::StreakAdvanced { .. } => EventTopic::Streaks,
            Self::ReferralRegistered { .. } | Self::ReferralBonusPaid { .. } => {
                EventTopic::Referrals
            }
            Self::SocialLinked { .. } => EventTopic::Social,
            Self::StakeRecorded { .. } => EventTopic::Staking,
            Self::StakeJobFailed { .. } => EventTopic::DeadLetter,
        }
    }

    /// Address the event is about (the referrer for referral events).
    #[must_use]
    pub fn address(&self) -> &WalletAddress {
        match self {
            Self::PointsCredited { address, .. }
            | Self::WeeklyBonusAwarded { address, .. }
            | Self::StreakAdvanced { address, .. }
            | Self::SocialLinked { address, .. }
            | Self::StakeRecorded { address, .. }
            | Self::StakeJobFailed { address, .. } => address,
            Self::ReferralRegistered { referrer, .. } | Self::ReferralBonusPaid { referrer, .. } => {
                referrer
            }
        }
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Credits,
    Streaks,
    Referrals,
    Social,
    Staking,
    /// Jobs that exhausted their retries or failed permanently.
    DeadLetter,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Addresses to include. Empty means all addresses.
    pub addresses: Vec<WalletAddress>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            addresses: Vec::new(),
        }
    }

    /// Create a filter for events about one address.
    #[must_use]
    pub fn for_address(address: WalletAddress) -> Self {
        Self {
            topics: Vec::new(),
            addresses: vec![address],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let address_match = self.addresses.is_empty() || self.addresses.contains(event.address());

        topic_match && address_match
    }
}
