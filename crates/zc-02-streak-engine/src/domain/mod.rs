//! Streak domain

pub mod cooldown;
pub mod streak;
pub mod weekly;
