//! Test doubles and receipt builders shared with the integration suite.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{StakeEventType, TxHash, WalletAddress};

use crate::domain::abi::{address_topic, encode_words, topic_for};
use crate::domain::receipt::{Log, TxReceipt};
use crate::ports::{ChainOracle, OracleError};

/// Log emitted by `contract` for `user` with the given data words.
pub fn stake_log(
    contract: &WalletAddress,
    event_type: StakeEventType,
    user: &WalletAddress,
    words: &[u128],
) -> Log {
    Log {
        address: contract.clone(),
        topics: vec![topic_for(event_type), address_topic(user)],
        data: encode_words(words),
    }
}

/// Successful receipt at block 1.
pub fn receipt(tx_hash: TxHash, to: Option<WalletAddress>, logs: Vec<Log>) -> TxReceipt {
    TxReceipt {
        tx_hash,
        success: true,
        to,
        block_number: 1,
        logs,
    }
}

#[derive(Debug, Default)]
struct MockState {
    receipts: HashMap<TxHash, TxReceipt>,
    /// Remaining scripted failures per transaction.
    failures: HashMap<TxHash, (u32, OracleError)>,
    calls: u32,
}

/// Oracle answering from an in-memory receipt table.
#[derive(Debug, Default)]
pub struct MockChainOracle {
    state: Mutex<MockState>,
}

impl MockChainOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, receipt: TxReceipt) {
        self.state
            .lock()
            .receipts
            .insert(receipt.tx_hash.clone(), receipt);
    }

    /// Fail the next `times` lookups of `tx_hash` with `error`.
    pub fn fail_times(&self, tx_hash: &TxHash, times: u32, error: OracleError) {
        self.state
            .lock()
            .failures
            .insert(tx_hash.clone(), (times, error));
    }

    pub fn calls(&self) -> u32 {
        self.state.lock().calls
    }
}

#[async_trait]
impl ChainOracle for MockChainOracle {
    async fn transaction_receipt(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>, OracleError> {
        let mut state = self.state.lock();
        state.calls += 1;
        if let Some((remaining, error)) = state.failures.get_mut(tx_hash) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(error.clone());
            }
        }
        Ok(state.receipts.get(tx_hash).cloned())
    }
}
