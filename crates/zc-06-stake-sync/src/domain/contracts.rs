//! Staking contract addresses

use shared_types::{ContractKind, WalletAddress};

/// The two staking contracts whose events earn points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingContracts {
    pub native: WalletAddress,
    pub token: WalletAddress,
}

impl StakingContracts {
    pub fn new(native: WalletAddress, token: WalletAddress) -> Self {
        Self { native, token }
    }

    /// Which contract `address` is, if either.
    pub fn kind_of(&self, address: &WalletAddress) -> Option<ContractKind> {
        if *address == self.native {
            Some(ContractKind::Native)
        } else if *address == self.token {
            Some(ContractKind::Token)
        } else {
            None
        }
    }
}
