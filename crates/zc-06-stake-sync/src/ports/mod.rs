//! Ports

pub mod outbound;

pub use outbound::{ChainOracle, OracleError};
