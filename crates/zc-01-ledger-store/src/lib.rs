//! # zc-01-ledger-store
//!
//! Durable storage for the incentive ledger.
//!
//! ## Model
//!
//! One ordered key space. All mutations go through a `StoreTransaction`:
//!
//! - `get_for_update` / `put` / `delete` take an exclusive per-key lock that
//!   is held until commit or rollback, including on keys that do not exist
//!   yet. This is what serializes two writers on the same account row
//!   without any global lock.
//! - Writes are buffered and applied atomically on `commit`. Dropping a
//!   transaction rolls it back.
//! - Lock waits are bounded; a timeout surfaces as a retryable
//!   `StoreError::LockTimeout`.
//!
//! ## Adapters
//!
//! - `InMemoryKvStore`: lock table + condvar, with fault injection for tests
//! - `RocksDbStore` (feature `rocksdb`): `TransactionDB` pessimistic locking

pub mod adapters;
pub mod codec;
pub mod error;
pub mod keys;
pub mod ports;

pub use adapters::memory::{InMemoryKvStore, MemoryStoreConfig};
#[cfg(feature = "rocksdb")]
pub use adapters::rocksdb_adapter::{RocksDbConfig, RocksDbStore};
pub use codec::{decode, encode};
pub use error::{StoreError, StoreResult};
pub use ports::{KeyValueStore, StoreTransaction};
