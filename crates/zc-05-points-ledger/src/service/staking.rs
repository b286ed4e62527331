//! Stake events and staking history.

use shared_bus::LedgerEvent;
use shared_types::{Clock, ContractKind, StakeEventType, StreakType, TaskKind, TxHash, WalletAddress};
use tracing::debug;
use zc_01_ledger_store::{decode, keys, KeyValueStore};
use zc_04_read_cache::{CacheKey, ReadCacheExt};
use zug_telemetry::{component_span, log_credit_event};

use super::{signed, LedgerService, COMPONENT};
use crate::domain::stake::{StakeEvent, StakeRecord};
use crate::domain::views::StakeOutcome;
use crate::error::LedgerResult;

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Record a staking-contract event, once per transaction hash.
    ///
    /// `Staked` and `Compounded` are credited (boosted) and advance the
    /// STAKE streak; the first one on each contract also settles the
    /// referee's stake referral flag. Other event types are history only.
    pub fn record_stake_event(&self, event: &StakeEvent) -> LedgerResult<StakeOutcome> {
        let _span = component_span!(
            "record_stake_event",
            component = COMPONENT,
            tx_hash = %event.tx_hash
        )
        .entered();

        let outcome = self.in_txn("record_stake_event", |txn| {
            let address = &event.address;
            let now = txn.now();
            let mut locked = txn.lock_account(address)?;

            let record_key = keys::stake(&event.tx_hash);
            if txn.read_for_update::<StakeRecord>(&record_key)?.is_some() {
                txn.effects.duplicates.push("STAKE_EVENT");
                return Ok(StakeOutcome {
                    points_awarded: 0,
                    credited: false,
                    recorded: false,
                    stake_streak: None,
                });
            }

            let mut points = 0;
            let mut credited = false;
            let mut stake_streak = None;

            if event.event_type.is_qualifying() {
                let task = TaskKind::Stake {
                    contract: event.contract,
                    tx: event.tx_hash.clone(),
                };
                if txn.is_recorded(address, &task)? {
                    txn.effects.duplicates.push(task.family());
                } else {
                    let amount = locked
                        .account
                        .multiplier
                        .apply(self.config.rewards.stake(event.contract));
                    txn.append_credit(&mut locked, &task, signed(amount), None)?;
                    points = amount;
                    credited = true;
                }

                let previous = txn.lock_streak(address, StreakType::Stake)?;
                let (state, transition) = self.streaks.advance(previous.as_ref(), now);
                if transition.changed() {
                    txn.save_streak(address, StreakType::Stake, &state)?;
                }
                stake_streak = Some(state.current_streak);

                self.stake_bonus_in(txn, address, event.contract)?;
            }

            let record = StakeRecord::from_event(event, points, now);
            txn.write(&record_key, &record)?;
            txn.write(
                &keys::stake_index(address, now.timestamp_millis(), &event.tx_hash),
                &event.tx_hash,
            )?;
            txn.save_account(&mut locked)?;

            txn.effects.events.push(LedgerEvent::StakeRecorded {
                address: address.clone(),
                tx_hash: event.tx_hash.clone(),
                event_type: event.event_type,
                contract: event.contract,
                points,
            });
            Ok(StakeOutcome {
                points_awarded: points,
                credited,
                recorded: true,
                stake_streak,
            })
        })
        .map_err(|e| {
            let attempted = if event.event_type.is_qualifying() {
                signed(self.config.rewards.stake(event.contract))
            } else {
                0
            };
            self.credit_failed(&event.address, &event.event_type, attempted, e)
        })?;

        if outcome.credited {
            log_credit_event!(
                info,
                COMPONENT,
                "Stake event credited",
                event.address,
                event.event_type,
                outcome.points_awarded,
                tx_hash = %event.tx_hash,
                contract = %event.contract
            );
        } else {
            debug!(
                component = COMPONENT,
                address = %event.address,
                tx_hash = %event.tx_hash,
                event_type = %event.event_type,
                recorded = outcome.recorded,
                "Stake event stored without credit"
            );
        }
        Ok(outcome)
    }

    /// Newest stake records for `address`, optionally filtered.
    pub fn get_staking_history(
        &self,
        address: &WalletAddress,
        contract: Option<ContractKind>,
        event_types: Option<&[StakeEventType]>,
    ) -> LedgerResult<Vec<StakeRecord>> {
        let unfiltered = contract.is_none() && event_types.is_none();
        let cache_key = CacheKey::StakingHistory(address.clone());
        if unfiltered {
            if let Some(hit) = self.cache.get_json::<Vec<StakeRecord>>(&cache_key) {
                return Ok(hit);
            }
        }

        let mut records = Vec::new();
        for (_, value) in self
            .store
            .scan_prefix(&keys::stake_index_prefix(address), None)?
        {
            let tx: TxHash = decode(&value)?;
            let Some(bytes) = self.store.get(&keys::stake(&tx))? else {
                continue;
            };
            let record: StakeRecord = decode(&bytes)?;
            if contract.is_some_and(|c| c != record.contract) {
                continue;
            }
            if event_types.is_some_and(|types| !types.contains(&record.event_type)) {
                continue;
            }
            records.push(record);
            if records.len() >= self.config.max_history {
                break;
            }
        }

        if unfiltered {
            self.cache
                .set_json(cache_key, &records, self.config.profile_ttl);
        }
        Ok(records)
    }
}
