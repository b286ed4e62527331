//! Receipt validation and stake event extraction

use shared_types::{StakeEventType, WalletAddress};
use zc_05_points_ledger::StakeEvent;

use crate::domain::abi::{event_type_for, topic_address, word_u128, word_u64, word_u8};
use crate::domain::contracts::StakingContracts;
use crate::domain::receipt::{Log, TxReceipt};
use crate::error::{StakeSyncError, StakeSyncResult};

/// Fields read from one recognised log.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DecodedLog {
    event_type: StakeEventType,
    user: WalletAddress,
    amount_wei: u128,
    harvested_yield_wei: Option<u128>,
    deposit_id: Option<u64>,
    tier_id: Option<u8>,
}

fn decode_log(log: &Log) -> StakeSyncResult<Option<DecodedLog>> {
    let Some(event_type) = log.topics.first().and_then(event_type_for) else {
        return Ok(None);
    };
    let user_topic = log.topics.get(1).ok_or_else(|| StakeSyncError::MalformedLog {
        reason: format!("{event_type} log without indexed user"),
    })?;
    let user = topic_address(user_topic)?;
    let data = &log.data;

    let decoded = match event_type {
        StakeEventType::Staked => DecodedLog {
            event_type,
            user,
            amount_wei: word_u128(data, 1)?,
            harvested_yield_wei: None,
            deposit_id: Some(word_u64(data, 0)?),
            tier_id: Some(word_u8(data, 2)?),
        },
        StakeEventType::Compounded | StakeEventType::Withdrawn => DecodedLog {
            event_type,
            user,
            amount_wei: word_u128(data, 1)?,
            harvested_yield_wei: None,
            deposit_id: Some(word_u64(data, 0)?),
            tier_id: None,
        },
        StakeEventType::RewardClaimed => DecodedLog {
            event_type,
            user,
            amount_wei: word_u128(data, 0)?,
            harvested_yield_wei: None,
            deposit_id: None,
            tier_id: None,
        },
        StakeEventType::UnstakeRequested => DecodedLog {
            event_type,
            user,
            amount_wei: word_u128(data, 1)?,
            harvested_yield_wei: Some(word_u128(data, 2)?),
            deposit_id: Some(word_u64(data, 0)?),
            tier_id: None,
        },
    };
    Ok(Some(decoded))
}

/// Validate `receipt` and extract the staking event it carries for `user`.
///
/// The transaction must have succeeded and targeted one of the staking
/// contracts. The first recognised log emitted by that contract for `user`
/// wins; logs from other emitters are ignored.
pub fn decode_stake_event(
    receipt: &TxReceipt,
    user: &WalletAddress,
    contracts: &StakingContracts,
) -> StakeSyncResult<StakeEvent> {
    if !receipt.success {
        return Err(StakeSyncError::TransactionFailed {
            tx_hash: receipt.tx_hash.clone(),
        });
    }
    let (target, contract) = receipt
        .to
        .as_ref()
        .and_then(|to| contracts.kind_of(to).map(|kind| (to, kind)))
        .ok_or_else(|| StakeSyncError::WrongContract {
            to: receipt.to.clone(),
        })?;

    let mut other_user = None;
    for log in receipt.logs.iter().filter(|l| l.address == *target) {
        let Some(decoded) = decode_log(log)? else {
            continue;
        };
        if decoded.user != *user {
            other_user.get_or_insert(decoded.user);
            continue;
        }
        return Ok(StakeEvent {
            address: user.clone(),
            tx_hash: receipt.tx_hash.clone(),
            event_type: decoded.event_type,
            contract,
            amount_wei: decoded.amount_wei,
            harvested_yield_wei: decoded.harvested_yield_wei,
            block_number: receipt.block_number,
            deposit_id: decoded.deposit_id,
            tier_id: decoded.tier_id,
        });
    }

    Err(match other_user {
        Some(found) => StakeSyncError::UserMismatch {
            expected: user.clone(),
            found,
        },
        None => StakeSyncError::EventNotFound {
            tx_hash: receipt.tx_hash.clone(),
        },
    })
}
