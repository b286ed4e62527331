//! # zc-02-streak-engine
//!
//! Per `(address, streak type)` day counters, computed on UTC calendar days.
//!
//! ## State Machine
//!
//! ```text
//! no record ──────────────→ 1
//! last == today ──────────→ unchanged            (duplicate same-day action)
//! last == yesterday ──────→ n + 1, or 1 if n ≥ 7 (cycle wrap)
//! last <  yesterday ──────→ 1                    (gap)
//! ```
//!
//! 23:59 UTC followed by 00:01 UTC continues a streak; 00:01 and 23:59 of
//! the same UTC day is one action.
//!
//! Everything here is pure: callers pass `now` from their clock and persist
//! the returned state themselves.

pub mod domain;

pub use domain::cooldown::{cooldown_status, CooldownStatus};
pub use domain::streak::{StreakEngine, StreakState, StreakTransition, DEFAULT_CYCLE_LENGTH};
pub use domain::weekly::{WeeklyBonusPolicy, WeeklyEligibility};
