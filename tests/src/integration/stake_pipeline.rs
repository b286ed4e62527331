//! # Stake Pipeline
//!
//! ```text
//! JobQueue ──→ StakeSyncWorker ──→ MockChainOracle (receipt)
//!                    │
//!                    └──→ LedgerService ──→ StakeRecorded / StakeJobFailed
//! ```
//!
//! The queue folds jobs that are already in flight; the ledger folds
//! redeliveries of a transaction it has already recorded.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shared_bus::{job_queue, EnqueueOutcome, EventFilter, EventTopic, JobQueue, LedgerEvent};
    use shared_types::{StakeEventType, WalletAddress};
    use tokio::time::timeout;
    use zc_01_ledger_store::InMemoryKvStore;
    use zc_06_stake_sync::ports::OracleError;
    use zc_06_stake_sync::test_utils::{receipt, stake_log, MockChainOracle};
    use zc_06_stake_sync::{StakeSyncJob, StakeSyncWorker, StakingContracts, WorkerConfig};

    use crate::fixtures::{addr, tx, Harness};

    fn native() -> WalletAddress {
        addr(0xA1)
    }

    fn token() -> WalletAddress {
        addr(0xA2)
    }

    fn start_worker(
        h: &Harness,
        oracle: &Arc<MockChainOracle>,
    ) -> (JobQueue<StakeSyncJob>, tokio::task::JoinHandle<()>) {
        let worker: StakeSyncWorker<InMemoryKvStore, _, MockChainOracle> = StakeSyncWorker::new(
            Arc::clone(&h.ledger),
            Arc::clone(oracle),
            StakingContracts::new(native(), token()),
            WorkerConfig::for_testing(),
        )
        .with_publisher(h.bus.clone());
        let (queue, jobs) = job_queue::<StakeSyncJob>();
        (queue, tokio::spawn(worker.run(jobs)))
    }

    async fn wait_idle(queue: &JobQueue<StakeSyncJob>) {
        timeout(Duration::from_secs(5), async {
            while queue.in_flight() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("queue did not drain");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_redelivery_is_folded_twice() {
        let h = Harness::new();
        let oracle = Arc::new(MockChainOracle::new());
        let user = addr(1);
        oracle.insert(receipt(
            tx(1),
            Some(token()),
            vec![stake_log(&token(), StakeEventType::Staked, &user, &[1, 5_000, 2, 0])],
        ));
        let job = StakeSyncJob::new(user.clone(), tx(1));

        let (queue, jobs) = job_queue::<StakeSyncJob>();
        assert_eq!(queue.enqueue(job.clone()).await.unwrap(), EnqueueOutcome::Enqueued);
        assert_eq!(queue.enqueue(job.clone()).await.unwrap(), EnqueueOutcome::Duplicate);

        let mut staking = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Staking]));
        let worker: StakeSyncWorker<InMemoryKvStore, _, MockChainOracle> = StakeSyncWorker::new(
            Arc::clone(&h.ledger),
            Arc::clone(&oracle),
            StakingContracts::new(native(), token()),
            WorkerConfig::for_testing(),
        );
        let handle = tokio::spawn(worker.run(jobs));

        let event = timeout(Duration::from_secs(5), staking.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, LedgerEvent::StakeRecorded { points: 20, .. }));
        wait_idle(&queue).await;

        // once completed the id is admitted again; the ledger folds it
        assert_eq!(queue.enqueue(job).await.unwrap(), EnqueueOutcome::Enqueued);
        wait_idle(&queue).await;
        drop(queue);
        handle.await.unwrap();

        assert_eq!(h.balance(&user), 20);
        assert_eq!(h.ledger.get_staking_history(&user, None, None).unwrap().len(), 1);
        assert_eq!(oracle.calls(), 2);
        h.assert_all_reconcile();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_chain_dead_letters() {
        let h = Harness::new();
        let oracle = Arc::new(MockChainOracle::new());
        let user = addr(2);
        oracle.fail_times(
            &tx(2),
            u32::MAX,
            OracleError::Unavailable {
                message: "rpc down".to_string(),
            },
        );
        let mut dlq = h
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::DeadLetter]));

        let (queue, handle) = start_worker(&h, &oracle);
        queue.enqueue(StakeSyncJob::new(user.clone(), tx(2))).await.unwrap();

        let event = timeout(Duration::from_secs(5), dlq.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            LedgerEvent::StakeJobFailed {
                address,
                attempts,
                retryable,
                ..
            } => {
                assert_eq!(address, user);
                assert_eq!(attempts, 3);
                assert!(retryable);
            }
            other => panic!("Expected StakeJobFailed, got {:?}", other),
        }

        drop(queue);
        handle.await.unwrap();
        assert_eq!(h.balance(&user), 0);
        assert!(h.ledger.get_account(&user).unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_foreign_stake_cannot_be_claimed() {
        let h = Harness::new();
        let oracle = Arc::new(MockChainOracle::new());
        let victim = addr(3);
        let claimer = addr(4);
        oracle.insert(receipt(
            tx(3),
            Some(native()),
            vec![stake_log(&native(), StakeEventType::Staked, &victim, &[7, 1_000, 1, 0])],
        ));
        let mut dlq = h
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::DeadLetter]));

        let (queue, handle) = start_worker(&h, &oracle);
        queue.enqueue(StakeSyncJob::new(claimer.clone(), tx(3))).await.unwrap();
        let event = timeout(Duration::from_secs(5), dlq.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            LedgerEvent::StakeJobFailed { retryable: false, attempts: 1, .. }
        ));
        wait_idle(&queue).await;

        // the job id is the tx hash, so the rightful owner can still submit it
        queue.enqueue(StakeSyncJob::new(victim.clone(), tx(3))).await.unwrap();
        wait_idle(&queue).await;
        drop(queue);
        handle.await.unwrap();

        assert_eq!(h.balance(&claimer), 0);
        assert_eq!(h.balance(&victim), 25);
        h.assert_all_reconcile();
    }
}
