//! # zc-06-stake-sync
//!
//! Turns "I staked, here is my transaction" into a verified ledger credit.
//!
//! A request handler submits a `StakeSyncJob` through `StakeJobQueue`, which
//! persists it before queueing, and returns immediately. The worker fetches the receipt through the
//! `ChainOracle` port, checks that the transaction succeeded against one of
//! the two staking contracts and emitted a recognised event for the
//! claiming wallet, then calls `LedgerService::record_stake_event`.
//!
//! | Failure | Handling |
//! |---------|----------|
//! | node unreachable, receipt not yet available, ledger busy | retry with backoff |
//! | reverted tx, wrong contract, no event, other user's event | dead-letter at once |
//! | retries exhausted | dead-letter |

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod test_utils;

pub use adapters::JsonRpcChainOracle;
pub use domain::abi::{event_topic, EVENT_SIGNATURES};
pub use domain::contracts::StakingContracts;
pub use domain::decode::decode_stake_event;
pub use domain::receipt::{Log, TxReceipt};
pub use error::{StakeSyncError, StakeSyncResult};
pub use ports::{ChainOracle, OracleError};
pub use service::{
    pending_jobs, JobOutcome, StakeJobQueue, StakeSyncJob, StakeSyncWorker, WorkerConfig,
};
