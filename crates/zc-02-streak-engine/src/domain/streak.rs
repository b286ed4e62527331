//! Day-counter transitions

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Days in one streak cycle. The action after day 7 starts over at 1.
pub const DEFAULT_CYCLE_LENGTH: u32 = 7;

/// Persisted streak state for one `(address, streak type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    /// UTC calendar day of the last qualifying action.
    pub last_action_date: NaiveDate,
    /// When the current cooldown window began. Same-day repeats keep it.
    pub cooldown_start_at: DateTime<Utc>,
}

/// What an action did to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// First ever action.
    Started,
    /// Already acted today; nothing changed.
    SameDay,
    /// Acted yesterday; counter incremented.
    Continued { from: u32 },
    /// Acted yesterday at or past the cycle length; counter back to 1.
    Wrapped { from: u32 },
    /// Missed at least one whole UTC day; counter back to 1.
    Reset { from: u32 },
    /// Stored day is after today (clock moved backwards); nothing changed.
    OutOfOrder,
}

impl StreakTransition {
    /// Whether the stored state has to be written.
    pub fn changed(self) -> bool {
        !matches!(self, Self::SameDay | Self::OutOfOrder)
    }
}

/// Streak rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakEngine {
    cycle_length: u32,
}

impl Default for StreakEngine {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
        }
    }
}

impl StreakEngine {
    pub fn new(cycle_length: u32) -> Self {
        Self {
            cycle_length: cycle_length.max(1),
        }
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle_length
    }

    /// Apply a qualifying action at `now`.
    pub fn advance(
        &self,
        previous: Option<&StreakState>,
        now: DateTime<Utc>,
    ) -> (StreakState, StreakTransition) {
        let today = now.date_naive();
        let fresh = |current| StreakState {
            current_streak: current,
            last_action_date: today,
            cooldown_start_at: now,
        };

        let Some(prev) = previous else {
            return (fresh(1), StreakTransition::Started);
        };

        let yesterday = today - Duration::days(1);
        let from = prev.current_streak;

        if prev.last_action_date == today {
            (prev.clone(), StreakTransition::SameDay)
        } else if prev.last_action_date > today {
            (prev.clone(), StreakTransition::OutOfOrder)
        } else if prev.last_action_date == yesterday {
            if from >= self.cycle_length {
                (fresh(1), StreakTransition::Wrapped { from })
            } else {
                (fresh(from + 1), StreakTransition::Continued { from })
            }
        } else {
            (fresh(1), StreakTransition::Reset { from })
        }
    }

    /// Counter as it stands on `today`: a streak whose last action is older
    /// than yesterday is already broken and counts as 0.
    pub fn effective_streak(&self, state: Option<&StreakState>, today: NaiveDate) -> u32 {
        match state {
            Some(s) if s.last_action_date == today => s.current_streak,
            Some(s) if s.last_action_date == today - Duration::days(1) => s.current_streak,
            _ => 0,
        }
    }
}
