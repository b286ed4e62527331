//! Stake events and history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ContractKind, StakeEventType, TxHash, WalletAddress};

/// A decoded staking-contract event, ready for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEvent {
    pub address: WalletAddress,
    pub tx_hash: TxHash,
    pub event_type: StakeEventType,
    pub contract: ContractKind,
    /// Principal (or claimed/withdrawn amount) in wei.
    pub amount_wei: u128,
    pub harvested_yield_wei: Option<u128>,
    pub block_number: u64,
    pub deposit_id: Option<u64>,
    pub tier_id: Option<u8>,
}

/// Stake history row, unique per transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub tx_hash: TxHash,
    pub address: WalletAddress,
    pub event_type: StakeEventType,
    pub contract: ContractKind,
    pub amount_wei: u128,
    pub harvested_yield_wei: Option<u128>,
    pub block_number: u64,
    pub deposit_id: Option<u64>,
    pub tier_id: Option<u8>,
    pub points_awarded: u64,
    pub recorded_at: DateTime<Utc>,
}

impl StakeRecord {
    pub fn from_event(event: &StakeEvent, points_awarded: u64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            tx_hash: event.tx_hash.clone(),
            address: event.address.clone(),
            event_type: event.event_type,
            contract: event.contract,
            amount_wei: event.amount_wei,
            harvested_yield_wei: event.harvested_yield_wei,
            block_number: event.block_number,
            deposit_id: event.deposit_id,
            tier_id: event.tier_id,
            points_awarded,
            recorded_at,
        }
    }
}
