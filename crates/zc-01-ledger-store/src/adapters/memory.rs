//! # In-Memory Store
//!
//! `BTreeMap` data plus a lock table. Locks are exclusive per key and are
//! released on commit, rollback or drop. Waiters park on a condvar until a
//! release or their deadline.
//!
//! Fault injection (`fail_next_commits`, `fail_puts_with_prefix`) lets tests
//! prove that a failure at any point leaves no partial state.

use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::error::{key_display, StoreError, StoreResult};
use crate::ports::{KeyValueStore, StoreTransaction};

/// In-memory store configuration
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// How long a transaction waits for a key lock
    pub lock_timeout: Duration,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
        }
    }
}

struct Shared {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// key -> owning transaction id
    locks: Mutex<HashMap<Vec<u8>, u64>>,
    released: Condvar,
    next_txn_id: AtomicU64,
    lock_timeout: Duration,
    failing_commits: AtomicUsize,
    failing_put_prefix: RwLock<Option<Vec<u8>>>,
    commits: AtomicU64,
}

/// In-memory transactional store. Clones share the same data.
#[derive(Clone)]
pub struct InMemoryKvStore {
    shared: Arc<Shared>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                data: RwLock::new(BTreeMap::new()),
                locks: Mutex::new(HashMap::new()),
                released: Condvar::new(),
                next_txn_id: AtomicU64::new(1),
                lock_timeout: config.lock_timeout,
                failing_commits: AtomicUsize::new(0),
                failing_put_prefix: RwLock::new(None),
                commits: AtomicU64::new(0),
            }),
        }
    }

    /// Make the next `n` commits fail without applying anything.
    pub fn fail_next_commits(&self, n: usize) {
        self.shared.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Make every `put` on a key with this prefix fail (`None` to clear).
    pub fn fail_puts_with_prefix(&self, prefix: Option<&[u8]>) {
        *self.shared.failing_put_prefix.write() = prefix.map(<[u8]>::to_vec);
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.shared.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.data.read().is_empty()
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.shared.commits.load(Ordering::Relaxed)
    }

    /// Keys currently locked by open transactions.
    pub fn locked_keys(&self) -> usize {
        self.shared.locks.lock().len()
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        let id = self.shared.next_txn_id.fetch_add(1, Ordering::Relaxed);
        trace!(txn = id, "Transaction started");
        Ok(Box::new(MemoryTransaction {
            shared: &self.shared,
            id,
            held: HashSet::new(),
            writes: BTreeMap::new(),
            finished: false,
        }))
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.shared.data.read().get(key).cloned())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: Option<usize>,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let data = self.shared.data.read();
        let iter = data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()));
        Ok(match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        })
    }
}

struct MemoryTransaction<'a> {
    shared: &'a Shared,
    id: u64,
    held: HashSet<Vec<u8>>,
    /// `None` marks a delete
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn lock(&mut self, key: &[u8]) -> StoreResult<()> {
        if self.held.contains(key) {
            return Ok(());
        }

        let deadline = Instant::now() + self.shared.lock_timeout;
        let mut locks = self.shared.locks.lock();
        loop {
            let owner = locks.get(key).copied();
            match owner {
                None => {
                    locks.insert(key.to_vec(), self.id);
                    break;
                }
                Some(owner) if owner == self.id => break,
                Some(_) => {
                    if self
                        .shared
                        .released
                        .wait_until(&mut locks, deadline)
                        .timed_out()
                        && locks.contains_key(key)
                    {
                        debug!(txn = self.id, key = %key_display(key), "Lock wait timed out");
                        return Err(StoreError::LockTimeout {
                            key: key_display(key),
                        });
                    }
                }
            }
        }
        drop(locks);

        self.held.insert(key.to_vec());
        Ok(())
    }

    fn release_all(&mut self) {
        if self.held.is_empty() {
            return;
        }
        let mut locks = self.shared.locks.lock();
        for key in self.held.drain() {
            if locks.get(&key) == Some(&self.id) {
                locks.remove(&key);
            }
        }
        drop(locks);
        self.shared.released.notify_all();
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(pending.clone());
        }
        Ok(self.shared.data.read().get(key).cloned())
    }

    fn get_for_update(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.lock(key)?;
        self.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if let Some(prefix) = self.shared.failing_put_prefix.read().as_deref() {
            if key.starts_with(prefix) {
                return Err(StoreError::Io {
                    message: format!("injected write failure on {}", key_display(key)),
                });
            }
        }
        self.lock(key)?;
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.lock(key)?;
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.finished = true;

        let injected = self
            .shared
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            self.release_all();
            return Err(StoreError::CommitFailed {
                message: "injected commit failure".to_string(),
            });
        }

        {
            let mut data = self.shared.data.write();
            for (key, value) in std::mem::take(&mut self.writes) {
                match value {
                    Some(v) => {
                        data.insert(key, v);
                    }
                    None => {
                        data.remove(&key);
                    }
                }
            }
        }
        self.shared.commits.fetch_add(1, Ordering::Relaxed);
        self.release_all();
        trace!(txn = self.id, "Transaction committed");
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            trace!(txn = self.id, writes = self.writes.len(), "Transaction rolled back");
        }
        self.release_all();
    }
}
