//! # Durability
//!
//! A RocksDB-backed ledger keeps balances, streaks and idempotency markers
//! across a close and reopen of the database.

#[cfg(all(test, feature = "rocksdb"))]
mod tests {
    use shared_types::{ContractKind, StakeEventType};
    use zc_01_ledger_store::{RocksDbConfig, RocksDbStore};

    use crate::fixtures::{addr, stake_event, Harness};

    fn open(path: &std::path::Path) -> Harness<RocksDbStore> {
        let store =
            RocksDbStore::open(RocksDbConfig::for_testing(path.to_string_lossy())).unwrap();
        Harness::with_store(store)
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let user = addr(1);
        let event = stake_event(&user, 1, ContractKind::Native, StakeEventType::Staked);

        {
            let h = open(dir.path());
            assert!(h.ledger.record_faucet_claim(&user, None).unwrap().allowed);
            assert!(h.ledger.record_stake_event(&event).unwrap().credited);
            assert_eq!(h.balance(&user), 50);
        }

        let h = open(dir.path());
        assert_eq!(h.balance(&user), 50);
        // same UTC day on a fresh clock: still in cooldown
        assert!(!h.ledger.record_faucet_claim(&user, None).unwrap().allowed);
        // the stake is already recorded
        assert!(!h.ledger.record_stake_event(&event).unwrap().recorded);
        assert_eq!(h.ledger.get_profile(&user).unwrap().rank, 1);
        h.assert_all_reconcile();
    }
}
