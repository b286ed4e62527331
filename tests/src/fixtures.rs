//! Shared fixtures for integration tests and benchmarks.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use shared_bus::InMemoryEventBus;
use shared_types::{ContractKind, ManualClock, StakeEventType, TxHash, WalletAddress};
use zc_01_ledger_store::{InMemoryKvStore, KeyValueStore};
use zc_04_read_cache::LruReadCache;
use zc_05_points_ledger::{LedgerConfig, LedgerService, StakeEvent};

pub type TestLedger<S = InMemoryKvStore> = LedgerService<S, Arc<ManualClock>>;

/// Ledger wired the way the runtime wires it: LRU cache and a live bus.
pub struct Harness<S: KeyValueStore = InMemoryKvStore> {
    pub ledger: Arc<TestLedger<S>>,
    pub clock: Arc<ManualClock>,
    pub bus: Arc<InMemoryEventBus>,
}

impl Harness<InMemoryKvStore> {
    pub fn new() -> Self {
        Self::with_store(InMemoryKvStore::new())
    }
}

impl Default for Harness<InMemoryKvStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeyValueStore> Harness<S> {
    /// Clock starts 2024-05-01 10:00 UTC.
    pub fn with_store(store: S) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        ));
        let bus = Arc::new(InMemoryEventBus::new());
        let ledger = LedgerService::new(store, Arc::clone(&clock), LedgerConfig::for_testing())
            .with_cache(Arc::new(LruReadCache::new(1024)))
            .with_publisher(bus.clone());
        Self {
            ledger: Arc::new(ledger),
            clock,
            bus,
        }
    }

    pub fn balance(&self, address: &WalletAddress) -> u64 {
        self.ledger
            .get_account(address)
            .unwrap()
            .map_or(0, |a| a.points)
    }

    /// Every stored balance equals the sum of its audit rows.
    pub fn assert_all_reconcile(&self) {
        let summary = self.ledger.reconcile_all().unwrap();
        assert!(summary.mismatches.is_empty(), "{:?}", summary.mismatches);
    }
}

pub fn addr(n: u64) -> WalletAddress {
    WalletAddress::parse(&format!("0x{:040x}", n)).unwrap()
}

pub fn tx(n: u64) -> TxHash {
    TxHash::parse(&format!("0x{:064x}", n)).unwrap()
}

pub fn stake_event(
    address: &WalletAddress,
    n: u64,
    contract: ContractKind,
    event_type: StakeEventType,
) -> StakeEvent {
    StakeEvent {
        address: address.clone(),
        tx_hash: tx(n),
        event_type,
        contract,
        amount_wei: 1_000_000_000_000_000_000,
        harvested_yield_wei: None,
        block_number: 1_000 + n,
        deposit_id: Some(n),
        tier_id: Some(1),
    }
}
