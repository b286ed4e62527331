//! # Runtime Configuration
//!
//! Unified configuration for the ledger process, read from `ZC_*`
//! environment variables. Every value has a default so an empty
//! environment yields a working in-memory ledger with no stake-sync worker.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ZC_STORE` | `memory` | `memory` or `rocksdb` |
//! | `ZC_DATA_DIR` | `./data` | RocksDB parent directory |
//! | `ZC_LOCK_TIMEOUT_MS` | `2000` | Row lock wait before `BUSY` |
//! | `ZC_TXN_MAX_RETRIES` | `8` | Whole-transaction retries on contention |
//! | `ZC_CACHE_CAPACITY` | `10000` | Read cache entries, 0 disables |
//! | `ZC_PROFILE_TTL_SECS` | `60` | Profile/leaderboard cache TTL |
//! | `ZC_STATS_TTL_SECS` | `300` | Global stats cache TTL |
//! | `ZC_REFERRAL_ORIGIN` | `https://zug.network` | Referral link origin |
//! | `ZC_RPC_URL` | unset | Chain JSON-RPC endpoint; enables stake sync |
//! | `ZC_STAKING_CONTRACT_NATIVE` | unset | Native staking contract |
//! | `ZC_STAKING_CONTRACT_TOKEN` | unset | Token staking contract |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use shared_types::WalletAddress;
use thiserror::Error;
use zc_05_points_ledger::LedgerConfig;
use zc_06_stake_sync::StakingContracts;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Read cache configuration.
    pub cache: CacheConfig,
    /// Chain access for stake sync.
    pub chain: ChainConfig,
    /// Ledger service configuration.
    pub ledger: LedgerConfig,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// The binary was built without the requested store.
    #[error("Store backend '{backend}' is not compiled in (enable the `{backend}` feature)")]
    UnsupportedBackend { backend: &'static str },

    /// `ZC_RPC_URL` is set without both staking contracts.
    #[error("Stake sync needs {missing} when ZC_RPC_URL is set")]
    IncompleteChain { missing: &'static str },
}

/// Which `KeyValueStore` adapter backs the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    RocksDb,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::RocksDb => "rocksdb",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "rocksdb" | "rocks" => Ok(Self::RocksDb),
            other => Err(format!("unknown store '{other}'")),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    /// Parent directory for the RocksDB database.
    pub data_dir: PathBuf,
    /// How long a transaction waits for a row lock.
    pub lock_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            data_dir: PathBuf::from("./data"),
            lock_timeout: Duration::from_secs(2),
        }
    }
}

impl StorageConfig {
    /// Database directory under `data_dir`.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }
}

/// Read cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum cached views. 0 turns the cache off.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

/// Chain access for the stake-sync worker.
#[derive(Debug, Clone, Default)]
pub struct ChainConfig {
    pub rpc_url: Option<String>,
    pub native_contract: Option<WalletAddress>,
    pub token_contract: Option<WalletAddress>,
}

impl ChainConfig {
    /// Whether the stake-sync worker should run.
    pub fn enabled(&self) -> bool {
        self.rpc_url.is_some()
    }

    pub fn contracts(&self) -> Option<StakingContracts> {
        Some(StakingContracts::new(
            self.native_contract.clone()?,
            self.token_contract.clone()?,
        ))
    }
}

fn parse_var<T, E>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<Option<T>, ConfigError>
where
    E: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => parse(value.trim())
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(backend) = parse_var(&lookup, "ZC_STORE", StoreBackend::from_str)? {
            config.storage.backend = backend;
        }
        if let Some(dir) = parse_var(&lookup, "ZC_DATA_DIR", PathBuf::from_str)? {
            config.storage.data_dir = dir;
        }
        if let Some(ms) = parse_var(&lookup, "ZC_LOCK_TIMEOUT_MS", u64::from_str)? {
            config.storage.lock_timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var(&lookup, "ZC_TXN_MAX_RETRIES", u32::from_str)? {
            config.ledger.max_txn_retries = retries;
        }
        if let Some(capacity) = parse_var(&lookup, "ZC_CACHE_CAPACITY", usize::from_str)? {
            config.cache.capacity = capacity;
        }
        if let Some(secs) = parse_var(&lookup, "ZC_PROFILE_TTL_SECS", u64::from_str)? {
            config.ledger.profile_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "ZC_STATS_TTL_SECS", u64::from_str)? {
            config.ledger.stats_ttl = Duration::from_secs(secs);
        }
        if let Some(origin) = parse_var(&lookup, "ZC_REFERRAL_ORIGIN", String::from_str)? {
            config.ledger.referral_origin = origin;
        }

        config.chain.rpc_url = parse_var(&lookup, "ZC_RPC_URL", String::from_str)?;
        config.chain.native_contract =
            parse_var(&lookup, "ZC_STAKING_CONTRACT_NATIVE", WalletAddress::parse)?;
        config.chain.token_contract =
            parse_var(&lookup, "ZC_STAKING_CONTRACT_TOKEN", WalletAddress::parse)?;

        Ok(config)
    }

    /// Check the configuration can actually be run by this binary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StoreBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::UnsupportedBackend {
                backend: StoreBackend::RocksDb.as_str(),
            });
        }
        if self.chain.enabled() {
            if self.chain.native_contract.is_none() {
                return Err(ConfigError::IncompleteChain {
                    missing: "ZC_STAKING_CONTRACT_NATIVE",
                });
            }
            if self.chain.token_contract.is_none() {
                return Err(ConfigError::IncompleteChain {
                    missing: "ZC_STAKING_CONTRACT_TOKEN",
                });
            }
        }
        Ok(())
    }
}
