//! Weekly streak bonus eligibility
//!
//! Eligible on `today` when:
//! - both effective streaks are at least the threshold,
//! - at least one of the two streaks was advanced today,
//! - no bonus has been awarded for `today` yet.
//!
//! Effective streaks (see `StreakEngine::effective_streak`) count a streak
//! last touched before yesterday as 0, so a user who stopped acting cannot
//! keep qualifying on a frozen counter.

use chrono::NaiveDate;

use crate::domain::streak::{StreakEngine, StreakState, DEFAULT_CYCLE_LENGTH};

/// Outcome of an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeeklyEligibility {
    Eligible,
    /// `min(faucet, stake)` below the threshold.
    StreakTooShort { min_streak: u32 },
    /// Neither streak advanced today.
    Stale,
    AlreadyAwarded,
}

impl WeeklyEligibility {
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Weekly bonus rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyBonusPolicy {
    pub threshold: u32,
    engine: StreakEngine,
}

impl Default for WeeklyBonusPolicy {
    fn default() -> Self {
        Self::new(StreakEngine::default(), DEFAULT_CYCLE_LENGTH)
    }
}

impl WeeklyBonusPolicy {
    pub fn new(engine: StreakEngine, threshold: u32) -> Self {
        Self { threshold, engine }
    }

    pub fn evaluate(
        &self,
        faucet: Option<&StreakState>,
        stake: Option<&StreakState>,
        today: NaiveDate,
        already_awarded: bool,
    ) -> WeeklyEligibility {
        let min_streak = self
            .engine
            .effective_streak(faucet, today)
            .min(self.engine.effective_streak(stake, today));

        if min_streak < self.threshold {
            return WeeklyEligibility::StreakTooShort { min_streak };
        }

        let fresh = [faucet, stake]
            .iter()
            .flatten()
            .any(|s| s.last_action_date == today);
        if !fresh {
            return WeeklyEligibility::Stale;
        }

        if already_awarded {
            return WeeklyEligibility::AlreadyAwarded;
        }

        WeeklyEligibility::Eligible
    }
}
