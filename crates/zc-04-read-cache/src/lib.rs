//! # zc-04-read-cache
//!
//! Cache-aside accelerator for expensive ledger reads (profile, leaderboard,
//! referral and global stats, staking history).
//!
//! The cache is advisory. Write paths never consult it; they invalidate the
//! views of every address they touch after commit, and the next read
//! repopulates from the store. A stale entry can only make a read old, never
//! make a credit happen twice.

pub mod adapters;
pub mod key;
pub mod ports;

pub use adapters::lru_ttl::{CacheStats, LruReadCache};
pub use adapters::noop::NoopCache;
pub use key::CacheKey;
pub use ports::{ReadCache, ReadCacheExt};

/// Default number of cached views.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
