//! Cache that stores nothing.

use std::time::Duration;

use shared_types::WalletAddress;

use crate::key::CacheKey;
use crate::ports::ReadCache;

/// Every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl ReadCache for NoopCache {
    fn get(&self, _key: &CacheKey) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: CacheKey, _payload: Vec<u8>, _ttl: Duration) {}

    fn invalidate(&self, _key: &CacheKey) {}

    fn invalidate_address(&self, _address: &WalletAddress) {}
}
