//! Storage adapters

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;
