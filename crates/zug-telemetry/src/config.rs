//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or full directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to register Prometheus metrics
    pub metrics_enabled: bool,

    /// Network identifier (testnet, mainnet, devnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "zug-ledger".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
            network: "testnet".to_string(),
        }
    }
}

fn flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ZC_SERVICE_NAME`: Service name (default: zug-ledger)
    /// - `ZC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `ZC_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `ZC_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `ZC_METRICS_ENABLED`: Register metrics (default: true)
    /// - `ZC_NETWORK`: Network name (default: testnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("ZC_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("ZC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: flag("ZC_CONSOLE_OUTPUT").unwrap_or(true),

            json_logs: flag("ZC_JSON_LOGS").unwrap_or(is_container),

            metrics_enabled: flag("ZC_METRICS_ENABLED").unwrap_or(true),

            network: env::var("ZC_NETWORK").unwrap_or(defaults.network),
        }
    }

    /// Config for tests: quiet, no metrics registration.
    pub fn for_testing() -> Self {
        Self {
            log_level: "warn".to_string(),
            console_output: false,
            metrics_enabled: false,
            ..Self::default()
        }
    }
}
