//! Referral tier domain

pub mod code;
pub mod progress;
pub mod tier;
