//! # Ledger Runtime Library
//!
//! Exposes the runtime's configuration and wiring for tests. The process
//! entry point is the `main.rs` binary.
//!
//! - `container/` - env configuration and construction of store, cache,
//!   event bus and ledger service
//! - `runtime` - background tasks (stake-sync worker, event logger) and
//!   graceful shutdown

pub mod container;
pub mod runtime;

pub use container::{ConfigError, LedgerContainer, RuntimeConfig, StoreBackend};
pub use runtime::LedgerRuntime;
