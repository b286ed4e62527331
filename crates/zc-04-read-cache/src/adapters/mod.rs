//! Cache adapters

pub mod lru_ttl;
pub mod noop;
