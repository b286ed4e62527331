//! Prometheus metrics for the incentive ledger.
//!
//! All metrics follow the naming convention: `zc_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LEDGER
    // =========================================================================

    /// Points credited, by task tag family
    pub static ref POINTS_CREDITED: CounterVec = CounterVec::new(
        Opts::new("zc_ledger_points_credited_total", "Points credited to accounts"),
        &["task"]
    ).expect("metric creation failed");

    /// Credits suppressed because the event was already recorded
    pub static ref DUPLICATE_CREDITS: CounterVec = CounterVec::new(
        Opts::new("zc_ledger_duplicate_credits_total", "Replayed or duplicate credit attempts"),
        &["task"]
    ).expect("metric creation failed");

    /// Faucet claims refused by the UTC-day cooldown
    pub static ref COOLDOWN_REJECTIONS: Counter = Counter::new(
        "zc_ledger_cooldown_rejections_total",
        "Faucet claims rejected by cooldown"
    ).expect("metric creation failed");

    /// Transactions retried after lock contention
    pub static ref LEDGER_TXN_RETRIES: Counter = Counter::new(
        "zc_ledger_txn_retries_total",
        "Ledger transactions retried after a busy error"
    ).expect("metric creation failed");

    /// Ledger transaction latency
    pub static ref LEDGER_TXN_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "zc_ledger_txn_duration_seconds",
            "Time spent inside a ledger transaction including commit"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // REFERRALS
    // =========================================================================

    /// Referral bonuses paid, by trigger
    pub static ref REFERRAL_BONUSES_PAID: CounterVec = CounterVec::new(
        Opts::new("zc_referral_bonuses_paid_total", "Referral bonus pairs paid"),
        &["trigger"]  // trigger: faucet/stake
    ).expect("metric creation failed");

    // =========================================================================
    // STAKE SYNC
    // =========================================================================

    /// Stake-sync jobs by outcome
    pub static ref STAKE_JOBS: CounterVec = CounterVec::new(
        Opts::new("zc_stake_sync_jobs_total", "Stake-sync jobs processed"),
        &["outcome"]  // outcome: credited/duplicate/history/retry/dead_letter
    ).expect("metric creation failed");

    // =========================================================================
    // READ CACHE
    // =========================================================================

    /// Read cache lookups
    pub static ref CACHE_LOOKUPS: CounterVec = CounterVec::new(
        Opts::new("zc_cache_lookups_total", "Read cache lookups"),
        &["view", "result"]  // result: hit/miss
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(POINTS_CREDITED.clone()),
        Box::new(DUPLICATE_CREDITS.clone()),
        Box::new(COOLDOWN_REJECTIONS.clone()),
        Box::new(LEDGER_TXN_RETRIES.clone()),
        Box::new(LEDGER_TXN_DURATION.clone()),
        Box::new(REFERRAL_BONUSES_PAID.clone()),
        Box::new(STAKE_JOBS.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
