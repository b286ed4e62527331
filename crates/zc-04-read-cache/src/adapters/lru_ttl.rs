//! # LRU + TTL Cache
//!
//! Bounded LRU of JSON payloads with a per-entry expiry. Expired entries
//! are removed lazily on lookup.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use shared_types::WalletAddress;
use zug_telemetry::{metric_inc, CACHE_LOOKUPS};

use crate::key::CacheKey;
use crate::ports::ReadCache;

struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
}

/// Cache statistics for monitoring.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

struct Inner {
    entries: LruCache<CacheKey, Entry>,
    hits: u64,
    misses: u64,
}

/// In-process view cache.
pub struct LruReadCache {
    inner: Mutex<Inner>,
}

impl LruReadCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(cap),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            capacity: inner.entries.cap().get(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl Default for LruReadCache {
    fn default() -> Self {
        Self::new(crate::DEFAULT_CACHE_CAPACITY)
    }
}

impl ReadCache for LruReadCache {
    fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let found = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.payload.clone()),
            Some(_) => {
                inner.entries.pop(key);
                None
            }
            None => None,
        };

        if found.is_some() {
            inner.hits += 1;
            metric_inc!(CACHE_LOOKUPS, &[key.view(), "hit"]);
        } else {
            inner.misses += 1;
            metric_inc!(CACHE_LOOKUPS, &[key.view(), "miss"]);
        }
        found
    }

    fn set(&self, key: CacheKey, payload: Vec<u8>, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.inner.lock().entries.put(key, Entry { payload, expires_at });
    }

    fn invalidate(&self, key: &CacheKey) {
        self.inner.lock().entries.pop(key);
    }

    fn invalidate_address(&self, address: &WalletAddress) {
        let mut inner = self.inner.lock();
        let doomed: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(k, _)| k.is_aggregate() || k.address() == Some(address))
            .map(|(k, _)| k.clone())
            .collect();
        for key in doomed {
            inner.entries.pop(&key);
        }
    }
}
