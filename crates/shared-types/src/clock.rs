//! # Clock Port
//!
//! All cooldown and streak maths runs on UTC calendar days. The ledger asks
//! a `Clock` for "now" instead of reading the system time directly.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::Mutex;

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to 00:00:00 of the next UTC day plus `offset`.
    pub fn advance_to_next_day(&self, offset: Duration) {
        let mut now = self.now.lock();
        *now = start_of_next_utc_day(*now) + offset;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Midnight UTC following `now`.
pub fn start_of_next_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    tomorrow.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Whole seconds until the next UTC midnight, at least 1.
pub fn seconds_until_next_utc_day(now: DateTime<Utc>) -> u64 {
    let remaining = (start_of_next_utc_day(now) - now).num_seconds();
    u64::try_from(remaining).unwrap_or(0).max(1)
}
