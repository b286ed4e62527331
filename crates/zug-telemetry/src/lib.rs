//! # Zug Telemetry
//!
//! Observability for the incentive ledger.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, pretty for
//!   development and JSON for containers
//! - **Metrics**: Prometheus counters and histograms for credits, duplicates,
//!   cooldowns, retries, referral payouts, stake jobs and the read cache
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zug_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     tracing::info!("ledger up");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ZC_SERVICE_NAME` | `zug-ledger` | Service name in log lines |
//! | `ZC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `ZC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `ZC_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `ZC_METRICS_ENABLED` | `true` | Register Prometheus metrics |
//! | `ZC_NETWORK` | `testnet` | Network label |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, CACHE_LOOKUPS, COOLDOWN_REJECTIONS,
    DUPLICATE_CREDITS, LEDGER_TXN_DURATION, LEDGER_TXN_RETRIES, POINTS_CREDITED,
    REFERRAL_BONUSES_PAID, STAKE_JOBS,
};
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    let tracing_guard = init_tracing(&config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: Option<MetricsHandle>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Span carrying the ledger component name.
///
/// ```rust,ignore
/// let _span = component_span!("faucet_claim", component = "points-ledger", address = %addr);
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for adding to a counter.
#[macro_export]
macro_rules! metric_add {
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).inc_by($value)
    };
}
