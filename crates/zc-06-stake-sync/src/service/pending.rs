//! # Durable Stake Jobs
//!
//! Every accepted job gets a `stakejob/{tx}` row before it reaches the
//! in-memory queue. The row is removed once the job is recorded, folded as
//! a duplicate or dead-lettered, so a process that stops mid-flight or
//! mid-backoff leaves the row behind and `recover` feeds it back in.
//! Replays are safe: the ledger deduplicates on the transaction hash.

use std::sync::Arc;

use shared_bus::{EnqueueOutcome, Job, JobQueue};
use shared_types::{Clock, TxHash};
use zc_01_ledger_store::{decode, encode, keys, KeyValueStore};
use zc_05_points_ledger::{LedgerError, LedgerService};
use zug_telemetry::log_event;

use super::job::StakeSyncJob;
use crate::error::{StakeSyncError, StakeSyncResult};

const COMPONENT: &str = "stake-sync";

/// Write the pending row for `job`.
pub(crate) fn persist<S: KeyValueStore>(store: &S, job: &StakeSyncJob) -> StakeSyncResult<()> {
    let mut txn = store.begin().map_err(LedgerError::from)?;
    let row = encode(job).map_err(LedgerError::from)?;
    txn.put(&keys::stake_job(&job.tx_hash), &row)
        .map_err(LedgerError::from)?;
    txn.commit().map_err(LedgerError::from)?;
    Ok(())
}

/// Drop the pending row for `tx_hash`. Absent rows are fine.
pub(crate) fn clear<S: KeyValueStore>(store: &S, tx_hash: &TxHash) -> StakeSyncResult<()> {
    let mut txn = store.begin().map_err(LedgerError::from)?;
    txn.delete(&keys::stake_job(tx_hash))
        .map_err(LedgerError::from)?;
    txn.commit().map_err(LedgerError::from)?;
    Ok(())
}

/// Every job accepted but not finished, in tx-hash order. Rows that no
/// longer decode are skipped with a warning.
pub fn pending_jobs<S: KeyValueStore>(store: &S) -> StakeSyncResult<Vec<StakeSyncJob>> {
    let rows = store
        .scan_prefix(keys::STAKE_JOB_PREFIX, None)
        .map_err(LedgerError::from)?;
    let mut jobs = Vec::with_capacity(rows.len());
    for (key, value) in rows {
        match decode::<StakeSyncJob>(&value) {
            Ok(job) => jobs.push(job),
            Err(e) => log_event!(
                warn,
                COMPONENT,
                "Skipping undecodable pending stake job",
                key = %String::from_utf8_lossy(&key),
                error = %e
            ),
        }
    }
    Ok(jobs)
}

/// Producer side of stake sync: persists each job, then queues it.
pub struct StakeJobQueue<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    queue: JobQueue<StakeSyncJob>,
    ledger: Arc<LedgerService<S, C>>,
}

impl<S, C> Clone for StakeJobQueue<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<S, C> StakeJobQueue<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    pub fn new(queue: JobQueue<StakeSyncJob>, ledger: Arc<LedgerService<S, C>>) -> Self {
        Self { queue, ledger }
    }

    /// Accept a job. Once this returns `Ok` the job survives a restart.
    ///
    /// If the worker side is gone the row stays and the job runs on the
    /// next `recover`.
    pub async fn submit(&self, job: StakeSyncJob) -> StakeSyncResult<EnqueueOutcome> {
        let ledger = Arc::clone(&self.ledger);
        let row = job.clone();
        tokio::task::spawn_blocking(move || persist(ledger.store(), &row))
            .await
            .map_err(|e| StakeSyncError::Internal {
                message: e.to_string(),
            })??;
        Ok(self.queue.enqueue(job).await?)
    }

    /// Re-queue every job left pending by an earlier process. Returns how
    /// many were queued (folded duplicates excluded).
    pub async fn recover(&self) -> StakeSyncResult<usize> {
        let ledger = Arc::clone(&self.ledger);
        let jobs = tokio::task::spawn_blocking(move || pending_jobs(ledger.store()))
            .await
            .map_err(|e| StakeSyncError::Internal {
                message: e.to_string(),
            })??;

        let mut queued = 0;
        for job in jobs {
            let id = job.job_id();
            if self.queue.enqueue(job).await? == EnqueueOutcome::Enqueued {
                queued += 1;
                log_event!(debug, COMPONENT, "Recovered pending stake job", job_id = %id);
            }
        }
        Ok(queued)
    }

    /// Job ids currently queued or running.
    pub fn in_flight(&self) -> usize {
        self.queue.in_flight()
    }
}
