//! # Ledger Service
//!
//! The single entry point for every balance-affecting operation.
//!
//! ## Transaction model
//!
//! Each operation runs as one store transaction via `in_txn`. Locks are per
//! key (account row, idempotency marker, link...), so two addresses never
//! wait on each other. When a lock wait times out the whole closure is
//! re-run from scratch, up to `LedgerConfig::max_txn_retries` times.
//!
//! After a successful commit, and only then:
//! 1. cached views of every touched address are invalidated,
//! 2. events are published,
//! 3. metrics are recorded.
//!
//! None of these can affect the committed result.

mod admin;
mod credit;
mod missions;
mod reads;
mod referral;
mod social;
mod staking;

#[cfg(test)]
mod tests;

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use shared_bus::{EventPublisher, NullPublisher};
use shared_types::{Clock, WalletAddress};
use tracing::{debug, error, warn};
use zc_01_ledger_store::{decode, keys, KeyValueStore};
use zc_02_streak_engine::{StreakEngine, WeeklyBonusPolicy};
use zc_04_read_cache::{NoopCache, ReadCache};
use zug_telemetry::{
    time_histogram, COOLDOWN_REJECTIONS, DUPLICATE_CREDITS, LEDGER_TXN_DURATION,
    LEDGER_TXN_RETRIES, POINTS_CREDITED, REFERRAL_BONUSES_PAID,
};

use crate::config::LedgerConfig;
use crate::domain::account::Account;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger_txn::{Effects, LedgerTxn};

const COMPONENT: &str = "points-ledger";

fn signed(points: u64) -> i64 {
    i64::try_from(points).unwrap_or(i64::MAX)
}

/// Points & streak ledger.
pub struct LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    store: S,
    clock: C,
    publisher: Arc<dyn EventPublisher>,
    cache: Arc<dyn ReadCache>,
    config: LedgerConfig,
    streaks: StreakEngine,
    weekly: WeeklyBonusPolicy,
}

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Ledger with no event subscribers and no read cache.
    pub fn new(store: S, clock: C, config: LedgerConfig) -> Self {
        let streaks = StreakEngine::new(config.streak_cycle_length);
        let weekly = WeeklyBonusPolicy::new(streaks, config.weekly_bonus_threshold);
        Self {
            store,
            clock,
            publisher: Arc::new(NullPublisher::default()),
            cache: Arc::new(NoopCache),
            config,
            streaks,
            weekly,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ReadCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `op` in a fresh transaction, retrying on lock contention.
    fn in_txn<T>(
        &self,
        name: &'static str,
        mut op: impl FnMut(&mut LedgerTxn<'_>) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut attempt: u32 = 0;
        loop {
            let outcome = {
                let _timer = time_histogram!(LEDGER_TXN_DURATION);
                let mut txn = LedgerTxn::new(self.store.begin()?, self.clock.now());
                match op(&mut txn) {
                    Ok(value) => txn.commit().map(|effects| (value, effects)),
                    Err(e) => Err(e),
                }
            };

            match outcome {
                Ok((value, effects)) => {
                    self.after_commit(effects);
                    return Ok(value);
                }
                Err(LedgerError::Storage(e))
                    if e.is_contention() && attempt < self.config.max_txn_retries =>
                {
                    attempt += 1;
                    LEDGER_TXN_RETRIES.inc();
                    debug!(
                        component = COMPONENT,
                        operation = name,
                        attempt,
                        error = %e,
                        "Retrying ledger transaction"
                    );
                    std::thread::sleep(self.backoff(attempt));
                }
                Err(e) => {
                    if matches!(e, LedgerError::Storage(_)) {
                        warn!(component = COMPONENT, operation = name, error = %e, "Ledger transaction failed");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Log a crediting call that did not complete, with what it was trying
    /// to credit, and hand the error back.
    pub(super) fn credit_failed(
        &self,
        address: &WalletAddress,
        task: &dyn Display,
        attempted: i64,
        e: LedgerError,
    ) -> LedgerError {
        if e.is_rejection() {
            warn!(
                component = COMPONENT,
                address = %address,
                task = %task,
                attempted,
                code = e.code(),
                error = %e,
                "Credit rejected"
            );
        } else {
            error!(
                component = COMPONENT,
                address = %address,
                task = %task,
                attempted,
                code = e.code(),
                error = %e,
                "Credit failed"
            );
        }
        e
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry_backoff.saturating_mul(attempt.min(10));
        let jitter_ms = rand::thread_rng().gen_range(0..=self.config.retry_backoff.as_millis().max(1));
        base + Duration::from_millis(u64::try_from(jitter_ms).unwrap_or(0))
    }

    fn after_commit(&self, effects: Effects) {
        for address in &effects.touched {
            self.cache.invalidate_address(address);
        }
        for (family, points) in &effects.credits {
            if *points > 0 {
                POINTS_CREDITED
                    .with_label_values(&[*family])
                    .inc_by(*points as f64);
            }
        }
        for family in &effects.duplicates {
            DUPLICATE_CREDITS.with_label_values(&[*family]).inc();
        }
        for _ in 0..effects.cooldown_rejections {
            COOLDOWN_REJECTIONS.inc();
        }
        for trigger in &effects.referral_bonuses {
            REFERRAL_BONUSES_PAID.with_label_values(&[*trigger]).inc();
        }
        for event in effects.events {
            self.publisher.publish(event);
        }
    }

    /// Committed account row, read without locking.
    pub fn get_account(&self, address: &WalletAddress) -> LedgerResult<Option<Account>> {
        self.store
            .get(&keys::account(address))?
            .map(|bytes| decode(&bytes))
            .transpose()
            .map_err(Into::into)
    }
}
