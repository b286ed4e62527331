//! # RocksDB Store
//!
//! `TransactionDB` with pessimistic locking. `get_for_update` maps directly
//! onto RocksDB's exclusive row locks, which also cover keys that are not
//! present yet. Lock waits time out after `lock_timeout_ms` and surface as
//! retryable errors.

use rocksdb::{
    Direction, ErrorKind, IteratorMode, Options, Transaction, TransactionDB,
    TransactionDBOptions, TransactionOptions, WriteOptions,
};
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::ports::{KeyValueStore, StoreTransaction};

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 32MB)
    pub write_buffer_size: usize,
    /// Row lock wait timeout in milliseconds
    pub lock_timeout_ms: i64,
    /// fsync the WAL on every commit (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/ledger".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 32 * 1024 * 1024,
            lock_timeout_ms: 2_000,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            lock_timeout_ms: 200,
            sync_writes: false,
        }
    }
}

fn map_err(context: &str, e: rocksdb::Error) -> StoreError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => StoreError::Busy {
            message: format!("{context}: {e}"),
        },
        _ => StoreError::Io {
            message: format!("{context}: {e}"),
        },
    }
}

/// RocksDB-backed ledger store
pub struct RocksDbStore {
    db: TransactionDB,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create the database
    pub fn open(config: RocksDbConfig) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let mut txn_db_opts = TransactionDBOptions::default();
        txn_db_opts.set_txn_lock_timeout(config.lock_timeout_ms);

        let db = TransactionDB::open(&opts, &txn_db_opts, &config.path)
            .map_err(|e| map_err("Failed to open RocksDB", e))?;

        info!(path = %config.path, "RocksDB ledger store opened");
        Ok(Self { db, config })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

impl KeyValueStore for RocksDbStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        let mut txn_opts = TransactionOptions::default();
        txn_opts.set_lock_timeout(self.config.lock_timeout_ms);
        let txn = self.db.transaction_opt(&self.write_options(), &txn_opts);
        Ok(Box::new(RocksTransaction { txn }))
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.db.get(key).map_err(|e| map_err("RocksDB get failed", e))
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: Option<usize>,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut results = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(|e| map_err("RocksDB iterator failed", e))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
            if limit.is_some_and(|n| results.len() >= n) {
                break;
            }
        }
        Ok(results)
    }
}

struct RocksTransaction<'db> {
    txn: Transaction<'db, TransactionDB>,
}

impl StoreTransaction for RocksTransaction<'_> {
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.txn
            .get(key)
            .map_err(|e| map_err("RocksDB txn get failed", e))
    }

    fn get_for_update(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.txn
            .get_for_update(key, true)
            .map_err(|e| map_err("RocksDB lock failed", e))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.txn
            .put(key, value)
            .map_err(|e| map_err("RocksDB txn put failed", e))
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.txn
            .delete(key)
            .map_err(|e| map_err("RocksDB txn delete failed", e))
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().map_err(|e| match map_err("RocksDB commit failed", e) {
            StoreError::Io { message } => StoreError::CommitFailed { message },
            other => other,
        })
    }
}
