//! # Staking Contract Event ABI
//!
//! Every event indexes the user as `topics[1]`; the remaining fields are
//! 32-byte words in `data`.
//!
//! | Event | data words |
//! |-------|------------|
//! | `Staked` | depositId, amount, tierId, autoCompound |
//! | `Compounded` | depositId, addedAmount |
//! | `RewardClaimed` | amount |
//! | `Withdrawn` | depositId, amount |
//! | `UnstakeRequested` | depositId, principal, harvestedYield |

use sha3::{Digest, Keccak256};
use shared_types::{StakeEventType, WalletAddress};

use crate::error::{StakeSyncError, StakeSyncResult};

pub const WORD: usize = 32;

/// Canonical signatures, hashed into `topics[0]`.
pub const EVENT_SIGNATURES: [(StakeEventType, &str); 5] = [
    (StakeEventType::Staked, "Staked(address,uint256,uint256,uint8,bool)"),
    (StakeEventType::Compounded, "Compounded(address,uint256,uint256)"),
    (StakeEventType::RewardClaimed, "RewardClaimed(address,uint256)"),
    (StakeEventType::Withdrawn, "Withdrawn(address,uint256,uint256)"),
    (
        StakeEventType::UnstakeRequested,
        "UnstakeRequested(address,uint256,uint256,uint256)",
    ),
];

/// Keccak-256 of an event signature.
pub fn event_topic(signature: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// `topics[0]` for an event type.
pub fn topic_for(event_type: StakeEventType) -> [u8; 32] {
    EVENT_SIGNATURES
        .iter()
        .find(|(t, _)| *t == event_type)
        .map(|(_, sig)| event_topic(sig))
        .unwrap_or([0u8; 32])
}

/// Event type whose signature hashes to `topic`.
pub fn event_type_for(topic: &[u8; 32]) -> Option<StakeEventType> {
    EVENT_SIGNATURES
        .iter()
        .find(|(_, sig)| event_topic(sig) == *topic)
        .map(|(t, _)| *t)
}

/// Indexed address topic: 12 zero bytes then the 20 address bytes.
pub fn address_topic(address: &WalletAddress) -> [u8; 32] {
    let mut topic = [0u8; 32];
    if let Ok(bytes) = hex::decode(address.as_str().trim_start_matches("0x")) {
        if bytes.len() == 20 {
            topic[12..].copy_from_slice(&bytes);
        }
    }
    topic
}

pub fn topic_address(topic: &[u8; 32]) -> StakeSyncResult<WalletAddress> {
    if topic[..12].iter().any(|b| *b != 0) {
        return Err(StakeSyncError::MalformedLog {
            reason: "address topic has non-zero padding".to_string(),
        });
    }
    WalletAddress::parse(&format!("0x{}", hex::encode(&topic[12..]))).map_err(|e| {
        StakeSyncError::MalformedLog {
            reason: e.to_string(),
        }
    })
}

fn word(data: &[u8], index: usize) -> StakeSyncResult<&[u8]> {
    data.get(index * WORD..(index + 1) * WORD)
        .ok_or_else(|| StakeSyncError::MalformedLog {
            reason: format!("data too short for word {index}"),
        })
}

/// Word `index` as an unsigned integer that must fit in 128 bits.
pub fn word_u128(data: &[u8], index: usize) -> StakeSyncResult<u128> {
    let word = word(data, index)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(StakeSyncError::MalformedLog {
            reason: format!("word {index} exceeds 128 bits"),
        });
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

pub fn word_u64(data: &[u8], index: usize) -> StakeSyncResult<u64> {
    u64::try_from(word_u128(data, index)?).map_err(|_| StakeSyncError::MalformedLog {
        reason: format!("word {index} exceeds 64 bits"),
    })
}

pub fn word_u8(data: &[u8], index: usize) -> StakeSyncResult<u8> {
    u8::try_from(word_u128(data, index)?).map_err(|_| StakeSyncError::MalformedLog {
        reason: format!("word {index} exceeds 8 bits"),
    })
}

/// ABI-encode unsigned words.
pub fn encode_words(words: &[u128]) -> Vec<u8> {
    let mut data = Vec::with_capacity(words.len() * WORD);
    for value in words {
        data.extend_from_slice(&[0u8; 16]);
        data.extend_from_slice(&value.to_be_bytes());
    }
    data
}
