//! # ZugChain Incentive Ledger Test Suite
//!
//! Unified test crate for behaviour that spans more than one crate.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/              # criterion benchmarks
//! └── src/
//!     ├── fixtures.rs       # shared harness, addresses, stake events
//!     └── integration/
//!         ├── flows.rs        # end-to-end user journeys
//!         ├── concurrency.rs  # multi-threaded exactly-once checks
//!         ├── stake_pipeline.rs # queue → worker → ledger
//!         └── durability.rs   # RocksDB reopen (feature `rocksdb`)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p zc-tests
//! cargo test -p zc-tests --features rocksdb
//! cargo bench -p zc-tests
//! ```

pub mod fixtures;
pub mod integration;
