//! Ledger domain types

pub mod account;
pub mod mission;
pub mod referral;
pub mod social;
pub mod stake;
pub mod views;
