//! Storage ports

use std::sync::Arc;

use crate::error::StoreResult;

/// Ordered key-value store with pessimistic transactions.
pub trait KeyValueStore: Send + Sync {
    /// Start a transaction.
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>>;

    /// Read committed data without locking.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Committed entries whose key starts with `prefix`, in key order.
    fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: Option<usize>,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        (**self).begin()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: Option<usize>,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        (**self).scan_prefix(prefix, limit)
    }
}

/// A unit of atomic work. Dropping it without `commit` rolls back.
pub trait StoreTransaction {
    /// Read, seeing this transaction's own writes. Takes no lock.
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Lock `key` exclusively, then read it. Works for absent keys.
    fn get_for_update(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Lock and buffer a write.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Lock and buffer a delete.
    fn delete(&mut self, key: &[u8]) -> StoreResult<()>;

    /// Apply every buffered write atomically and release locks.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}
