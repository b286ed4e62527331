//! # ZugChain Incentive Ledger
//!
//! Process entry point for the points & streak ledger.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics (`ZC_LOG_LEVEL`, `ZC_JSON_LOGS`, ...)
//! 2. Load and validate `ZC_*` configuration
//! 3. Open the configured store (`ZC_STORE`)
//! 4. Wire cache, event bus and ledger service
//! 5. Start the stake-sync worker when `ZC_RPC_URL` is set
//! 6. Run until Ctrl+C, then shut down gracefully

use std::sync::Arc;

use anyhow::{Context, Result};
use ledger_runtime::container::open_memory_store;
use ledger_runtime::{LedgerRuntime, RuntimeConfig, StoreBackend};
use shared_types::SystemClock;
use tracing::info;
use zc_01_ledger_store::KeyValueStore;
use zc_06_stake_sync::{ChainOracle, JsonRpcChainOracle};
use zug_telemetry::{init_telemetry, TelemetryConfig};

async fn run<S>(store: S, config: RuntimeConfig) -> Result<()>
where
    S: KeyValueStore + 'static,
{
    let oracle: Option<Arc<dyn ChainOracle>> = match &config.chain.rpc_url {
        Some(url) => {
            info!(rpc_url = %url, "Using JSON-RPC chain oracle");
            let oracle =
                JsonRpcChainOracle::new(url.as_str()).context("Failed to build chain oracle")?;
            Some(Arc::new(oracle) as Arc<dyn ChainOracle>)
        }
        None => None,
    };

    let mut runtime = LedgerRuntime::new(store, SystemClock, config);
    runtime.start(oracle);

    info!("Ledger is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}

#[cfg(feature = "rocksdb")]
async fn run_rocksdb(config: RuntimeConfig) -> Result<()> {
    let store = ledger_runtime::container::open_rocksdb_store(&config.storage)
        .context("Failed to open RocksDB store")?;
    run(store, config).await
}

#[cfg(not(feature = "rocksdb"))]
async fn run_rocksdb(_config: RuntimeConfig) -> Result<()> {
    anyhow::bail!("built without the `rocksdb` feature")
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let config = RuntimeConfig::from_env()?;
    config.validate()?;

    match config.storage.backend {
        StoreBackend::Memory => {
            let store = open_memory_store(&config.storage);
            run(store, config).await
        }
        StoreBackend::RocksDb => run_rocksdb(config).await,
    }
}
