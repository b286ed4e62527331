//! # Ledger Runtime
//!
//! Owns the background tasks of a running ledger process.
//!
//! ```text
//! StakeJobQueue ──→ StakeSyncWorker ──→ LedgerService ──→ InMemoryEventBus
//!                                  │                                      │
//!                           StakeJobFailed ──────────────────────→ event logger
//! ```
//!
//! Every task selects on the shared shutdown channel and exits when it
//! flips to `true`. Stake jobs accepted by an earlier process and never
//! finished are replayed from the store on `start`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_bus::{job_queue, EventFilter, Subscription};
use shared_types::Clock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zc_01_ledger_store::KeyValueStore;
use zc_06_stake_sync::{ChainOracle, StakeJobQueue, StakeSyncJob, StakeSyncWorker, WorkerConfig};

use crate::container::{LedgerContainer, RuntimeConfig};

/// How long `shutdown` waits for tasks to observe the signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The running ledger process.
pub struct LedgerRuntime<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    container: Arc<LedgerContainer<S, C>>,
    stake_jobs: Option<StakeJobQueue<S, C>>,
    worker_config: WorkerConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S, C> LedgerRuntime<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: S, clock: C, config: RuntimeConfig) -> Self {
        info!("Creating ZugChain incentive ledger runtime");
        let container = Arc::new(LedgerContainer::new(store, clock, config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container,
            stake_jobs: None,
            worker_config: WorkerConfig::default(),
            tasks: Mutex::new(Vec::new()),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Override the stake-sync retry policy.
    pub fn with_worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker_config = config;
        self
    }

    /// Start background tasks. Without an oracle no stake-sync worker runs
    /// and `stake_jobs` stays `None`.
    pub fn start(&mut self, oracle: Option<Arc<dyn ChainOracle>>) {
        info!("===========================================");
        info!("  ZugChain Incentive Ledger v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let subscription = self.container.bus.subscribe(EventFilter::all());
        self.spawn_event_logger(subscription);

        match (oracle, self.container.config.chain.contracts()) {
            (Some(oracle), Some(contracts)) => {
                let (queue, jobs) = job_queue::<StakeSyncJob>();
                let worker = StakeSyncWorker::new(
                    Arc::clone(&self.container.ledger),
                    oracle,
                    contracts,
                    self.worker_config.clone(),
                )
                .with_publisher(self.container.bus.clone());

                let mut shutdown = self.shutdown_rx.clone();
                let handle = tokio::spawn(async move {
                    tokio::select! {
                        _ = worker.run(jobs) => {}
                        _ = shutdown.changed() => {
                            info!("[stake-sync] Shutdown signal received");
                        }
                    }
                });
                self.tasks.lock().push(handle);

                let queue = StakeJobQueue::new(queue, Arc::clone(&self.container.ledger));
                self.spawn_recovery(queue.clone());
                self.stake_jobs = Some(queue);
                info!("Stake-sync worker started");
            }
            (Some(_), None) => {
                warn!("Chain oracle given without staking contracts, stake sync disabled");
            }
            (None, _) => info!("No chain RPC configured, stake sync disabled"),
        }

        match self.container.ledger.get_global_stats() {
            Ok(stats) => info!(
                users = stats.total_users,
                points = stats.total_points,
                activity = stats.total_activity,
                "Ledger ready"
            ),
            Err(e) => error!(error = %e, code = e.code(), "Failed to read ledger stats"),
        }
    }

    /// Runs beside the worker so a backlog larger than the queue capacity
    /// cannot stall it.
    fn spawn_recovery(&self, queue: StakeJobQueue<S, C>) {
        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                recovered = queue.recover() => match recovered {
                    Ok(0) => {}
                    Ok(n) => info!(jobs = n, "Replayed pending stake jobs"),
                    Err(e) => error!(error = %e, code = e.code(), "Failed to replay pending stake jobs"),
                },
                _ = shutdown.changed() => {}
            }
        });
        self.tasks.lock().push(handle);
    }

    fn spawn_event_logger(&self, mut subscription: Subscription) {
        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(event) => debug!(
                            topic = ?event.topic(),
                            address = %event.address(),
                            "Ledger event"
                        ),
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        info!("[events] Shutdown signal received");
                        break;
                    }
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    /// Producer handle for stake-sync jobs.
    pub fn stake_jobs(&self) -> Option<StakeJobQueue<S, C>> {
        self.stake_jobs.clone()
    }

    pub fn container(&self) -> Arc<LedgerContainer<S, C>> {
        Arc::clone(&self.container)
    }

    /// Signal every task to stop and wait for them, bounded by a grace
    /// period.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                warn!("Task did not stop within the grace period");
            }
        }

        info!("Shutdown complete");
    }
}
