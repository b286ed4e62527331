//! Cross-crate integration scenarios.

pub mod concurrency;
pub mod durability;
pub mod flows;
pub mod stake_pipeline;
