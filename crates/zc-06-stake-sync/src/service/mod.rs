//! # Stake-Sync Worker
//!
//! ```text
//! JobReceiver ──→ fetch receipt ──→ decode + validate ──→ record_stake_event
//!                  (ChainOracle)      (no ledger I/O)       (blocking pool)
//!                      │                    │                     │
//!                      └──── retryable ─────┴──── retryable ──────┘
//!                              │                   │
//!                     backoff 1s, 2s, ...   permanent / exhausted
//!                                                  │
//!                                         StakeJobFailed event
//! ```
//!
//! The receipt is fetched before any ledger transaction opens, so no row
//! lock is ever held across a network call. Redelivery is harmless: the
//! ledger deduplicates on the transaction hash.
//!
//! Jobs submitted through `StakeJobQueue` are persisted first; the worker
//! clears the pending row only after the job reaches a final outcome.

mod job;
mod pending;


pub use job::StakeSyncJob;
pub use pending::{pending_jobs, StakeJobQueue};

use std::sync::Arc;
use std::time::Duration;

use shared_bus::{EventPublisher, Job, JobReceiver, LedgerEvent, NullPublisher, DLQ_TOPIC};
use shared_types::Clock;
use zc_01_ledger_store::KeyValueStore;
use zc_05_points_ledger::{LedgerService, StakeOutcome};
use zug_telemetry::{log_event, log_tx_event, metric_inc, STAKE_JOBS};

use crate::domain::contracts::StakingContracts;
use crate::domain::decode::decode_stake_event;
use crate::error::{StakeSyncError, StakeSyncResult};
use crate::ports::ChainOracle;

const COMPONENT: &str = "stake-sync";

/// Retry policy.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Attempts per job, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each time.
    pub initial_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl WorkerConfig {
    pub fn for_testing() -> Self {
        Self {
            initial_backoff: Duration::from_millis(1),
            ..Self::default()
        }
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Qualifying event, points credited.
    Credited { points: u64, attempts: u32 },
    /// Stored as history without points.
    Recorded { attempts: u32 },
    /// The transaction was already recorded.
    Duplicate { attempts: u32 },
    /// Gave up; a `StakeJobFailed` event was published.
    DeadLettered {
        code: &'static str,
        attempts: u32,
        retryable: bool,
    },
}

impl JobOutcome {
    fn from_stake(outcome: &StakeOutcome, attempts: u32) -> Self {
        if !outcome.recorded {
            Self::Duplicate { attempts }
        } else if outcome.credited {
            Self::Credited {
                points: outcome.points_awarded,
                attempts,
            }
        } else {
            Self::Recorded { attempts }
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Credited { .. } => "credited",
            Self::Recorded { .. } => "history",
            Self::Duplicate { .. } => "duplicate",
            Self::DeadLettered { .. } => "dead_letter",
        }
    }
}

/// Consumes `StakeSyncJob`s and feeds verified events into the ledger.
pub struct StakeSyncWorker<S, C, O>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
    O: ChainOracle + ?Sized,
{
    ledger: Arc<LedgerService<S, C>>,
    oracle: Arc<O>,
    contracts: StakingContracts,
    publisher: Arc<dyn EventPublisher>,
    config: WorkerConfig,
}

impl<S, C, O> StakeSyncWorker<S, C, O>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
    O: ChainOracle + ?Sized,
{
    pub fn new(
        ledger: Arc<LedgerService<S, C>>,
        oracle: Arc<O>,
        contracts: StakingContracts,
        config: WorkerConfig,
    ) -> Self {
        Self {
            ledger,
            oracle,
            contracts,
            publisher: Arc::new(NullPublisher::default()),
            config,
        }
    }

    /// Where dead-letter events go.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Drain `jobs` until every producer is gone.
    pub async fn run(self, mut jobs: JobReceiver<StakeSyncJob>) {
        log_event!(info, COMPONENT, "Stake-sync worker started");
        while let Some(job) = jobs.recv().await {
            let id = job.job_id();
            self.handle(&job).await;
            self.clear_pending(&job).await;
            jobs.complete(&id);
        }
        log_event!(info, COMPONENT, "Stake-sync worker stopped");
    }

    /// Process one job with retries. Never fails; the outcome says how it
    /// ended.
    pub async fn handle(&self, job: &StakeSyncJob) -> JobOutcome {
        let mut attempt = 0;
        let mut delay = self.config.initial_backoff;
        loop {
            attempt += 1;
            match self.attempt(job).await {
                Ok(stake) => {
                    let outcome = JobOutcome::from_stake(&stake, attempt);
                    metric_inc!(STAKE_JOBS, &[outcome.label()]);
                    log_tx_event!(
                        info,
                        COMPONENT,
                        "Stake job done",
                        job.tx_hash,
                        address = %job.address,
                        outcome = outcome.label(),
                        points = stake.points_awarded,
                        attempt
                    );
                    return outcome;
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    metric_inc!(STAKE_JOBS, &["retry"]);
                    log_tx_event!(
                        warn,
                        COMPONENT,
                        "Stake job failed, retrying",
                        job.tx_hash,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return self.dead_letter(job, attempt, &e),
            }
        }
    }

    /// A failed delete only means the job is replayed, and folded, after
    /// the next restart.
    async fn clear_pending(&self, job: &StakeSyncJob) {
        let ledger = Arc::clone(&self.ledger);
        let tx_hash = job.tx_hash.clone();
        let cleared = tokio::task::spawn_blocking(move || pending::clear(ledger.store(), &tx_hash))
            .await
            .map_err(|e| StakeSyncError::Internal {
                message: e.to_string(),
            })
            .and_then(|result| result);
        if let Err(e) = cleared {
            log_tx_event!(
                warn,
                COMPONENT,
                "Failed to clear pending stake job",
                job.tx_hash,
                code = e.code(),
                error = %e
            );
        }
    }

    /// One pass: fetch, validate, record.
    async fn attempt(&self, job: &StakeSyncJob) -> StakeSyncResult<StakeOutcome> {
        let receipt = self
            .oracle
            .transaction_receipt(&job.tx_hash)
            .await?
            .ok_or_else(|| StakeSyncError::ReceiptNotFound {
                tx_hash: job.tx_hash.clone(),
            })?;
        let event = decode_stake_event(&receipt, &job.address, &self.contracts)?;

        let ledger = Arc::clone(&self.ledger);
        let outcome = tokio::task::spawn_blocking(move || ledger.record_stake_event(&event))
            .await
            .map_err(|e| StakeSyncError::Internal {
                message: e.to_string(),
            })??;
        Ok(outcome)
    }

    fn dead_letter(&self, job: &StakeSyncJob, attempts: u32, error: &StakeSyncError) -> JobOutcome {
        let retryable = error.is_retryable();
        metric_inc!(STAKE_JOBS, &["dead_letter"]);
        log_tx_event!(
            error,
            COMPONENT,
            "Stake job dead-lettered",
            job.tx_hash,
            topic = DLQ_TOPIC,
            address = %job.address,
            attempts,
            code = error.code(),
            retryable,
            error = %error
        );
        self.publisher.publish(LedgerEvent::StakeJobFailed {
            address: job.address.clone(),
            tx_hash: job.tx_hash.clone(),
            attempts,
            reason: error.to_string(),
            retryable,
        });
        JobOutcome::DeadLettered {
            code: error.code(),
            attempts,
            retryable,
        }
    }
}
