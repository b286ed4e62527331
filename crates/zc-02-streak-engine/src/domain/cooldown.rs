//! UTC-day cooldown

use chrono::{DateTime, NaiveDate, Utc};
use shared_types::seconds_until_next_utc_day;

/// Whether a once-per-UTC-day action may run now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Ready,
    /// Already done today; opens again at the next UTC midnight.
    Active { seconds_remaining: u64 },
}

impl CooldownStatus {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Cooldown for an action last performed on `last_day`.
pub fn cooldown_status(last_day: Option<NaiveDate>, now: DateTime<Utc>) -> CooldownStatus {
    match last_day {
        Some(day) if day >= now.date_naive() => CooldownStatus::Active {
            seconds_remaining: seconds_until_next_utc_day(now),
        },
        _ => CooldownStatus::Ready,
    }
}
