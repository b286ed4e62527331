//! # Ledger Container
//!
//! Builds the shared pieces once: store, read cache, event bus and the
//! ledger service that ties them together.

pub mod config;

pub use config::{CacheConfig, ChainConfig, ConfigError, RuntimeConfig, StorageConfig, StoreBackend};

use std::sync::Arc;

use shared_bus::InMemoryEventBus;
use shared_types::Clock;
use tracing::info;
use zc_01_ledger_store::{InMemoryKvStore, KeyValueStore, MemoryStoreConfig};
use zc_04_read_cache::{LruReadCache, NoopCache, ReadCache};
use zc_05_points_ledger::LedgerService;

#[cfg(feature = "rocksdb")]
use zc_01_ledger_store::{RocksDbConfig, RocksDbStore, StoreResult};

/// In-memory store with the configured lock timeout.
pub fn open_memory_store(config: &StorageConfig) -> InMemoryKvStore {
    InMemoryKvStore::with_config(MemoryStoreConfig {
        lock_timeout: config.lock_timeout,
    })
}

/// RocksDB store under `data_dir/ledger`.
#[cfg(feature = "rocksdb")]
pub fn open_rocksdb_store(config: &StorageConfig) -> StoreResult<RocksDbStore> {
    RocksDbStore::open(RocksDbConfig {
        path: config.ledger_path().to_string_lossy().into_owned(),
        lock_timeout_ms: i64::try_from(config.lock_timeout.as_millis()).unwrap_or(i64::MAX),
        ..RocksDbConfig::default()
    })
}

/// Initialized services shared by every task.
pub struct LedgerContainer<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    pub config: RuntimeConfig,
    pub ledger: Arc<LedgerService<S, C>>,
    pub bus: Arc<InMemoryEventBus>,
}

impl<S, C> LedgerContainer<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, config: RuntimeConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let cache: Arc<dyn ReadCache> = if config.cache.capacity == 0 {
            Arc::new(NoopCache)
        } else {
            Arc::new(LruReadCache::new(config.cache.capacity))
        };

        let ledger = LedgerService::new(store, clock, config.ledger.clone())
            .with_cache(cache)
            .with_publisher(bus.clone());

        info!(
            store = config.storage.backend.as_str(),
            cache_capacity = config.cache.capacity,
            "Ledger container initialized"
        );

        Self {
            config,
            ledger: Arc::new(ledger),
            bus,
        }
    }
}
