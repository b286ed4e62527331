//! Stake-sync job payload

use serde::{Deserialize, Serialize};
use shared_bus::Job;
use shared_types::{TxHash, WalletAddress};

/// "Look at this transaction for this wallet." Enqueued by request
/// handlers; folded per transaction hash while in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeSyncJob {
    pub address: WalletAddress,
    pub tx_hash: TxHash,
}

impl StakeSyncJob {
    pub fn new(address: WalletAddress, tx_hash: TxHash) -> Self {
        Self { address, tx_hash }
    }
}

impl Job for StakeSyncJob {
    fn job_id(&self) -> String {
        self.tx_hash.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_is_tx_hash() {
        let tx = TxHash::parse(&format!("0x{}", "AB".repeat(32))).unwrap();
        let job = StakeSyncJob::new(
            WalletAddress::parse(&format!("0x{}", "1".repeat(40))).unwrap(),
            tx.clone(),
        );
        assert_eq!(job.job_id(), tx.as_str());
        assert_eq!(job.job_id(), format!("0x{}", "ab".repeat(32)));
    }
}
