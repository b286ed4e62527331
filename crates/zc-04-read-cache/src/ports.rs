//! Cache port

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::WalletAddress;

use crate::key::CacheKey;

/// Advisory view cache. Payloads are opaque JSON bytes.
pub trait ReadCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Vec<u8>>;

    fn set(&self, key: CacheKey, payload: Vec<u8>, ttl: Duration);

    fn invalidate(&self, key: &CacheKey);

    /// Drop every per-address view of `address` and every aggregate view.
    fn invalidate_address(&self, address: &WalletAddress);
}

/// Typed helpers over [`ReadCache`].
pub trait ReadCacheExt: ReadCache {
    /// Cached value, or `None` on miss or undecodable payload.
    fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                self.invalidate(key);
                None
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: CacheKey, value: &T, ttl: Duration) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set(key, bytes, ttl),
            Err(e) => tracing::warn!(key = %key, error = %e, "Skipping cache write"),
        }
    }
}

impl<C: ReadCache + ?Sized> ReadCacheExt for C {}
