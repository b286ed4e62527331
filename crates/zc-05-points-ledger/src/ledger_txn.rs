//! # Ledger Transaction
//!
//! Typed view over one `StoreTransaction`. Everything a crediting
//! operation writes goes through here so that the balance, the audit row,
//! the idempotency marker and the leaderboard index move together.
//!
//! Lock order inside one transaction: the acting account, then its
//! idempotency markers and dependent records, then a counterparty account.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_bus::LedgerEvent;
use shared_types::{StreakType, TaskKind, WalletAddress};
use uuid::Uuid;
use zc_01_ledger_store::{decode, encode, keys, StoreTransaction};
use zc_02_streak_engine::StreakState;

use crate::domain::account::{Account, AuditEntry};
use crate::error::{LedgerError, LedgerResult};

/// Work to do once the transaction has committed.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pub events: Vec<LedgerEvent>,
    pub touched: Vec<WalletAddress>,
    /// `(metric family, points)` of committed credits.
    pub credits: Vec<(&'static str, i64)>,
    pub duplicates: Vec<&'static str>,
    pub cooldown_rejections: u32,
    pub referral_bonuses: Vec<&'static str>,
}

impl Effects {
    pub fn touch(&mut self, address: &WalletAddress) {
        if !self.touched.contains(address) {
            self.touched.push(address.clone());
        }
    }
}

/// An account row held under lock.
#[derive(Debug)]
pub(crate) struct LockedAccount {
    pub account: Account,
    /// Rank key as committed, `None` for a new row.
    rank_key: Option<Vec<u8>>,
}

impl LockedAccount {
    pub fn exists(&self) -> bool {
        self.rank_key.is_some()
    }
}

pub(crate) struct LedgerTxn<'a> {
    inner: Box<dyn StoreTransaction + 'a>,
    now: DateTime<Utc>,
    pub effects: Effects,
}

impl<'a> LedgerTxn<'a> {
    pub fn new(inner: Box<dyn StoreTransaction + 'a>, now: DateTime<Utc>) -> Self {
        Self {
            inner,
            now,
            effects: Effects::default(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn commit(self) -> LedgerResult<Effects> {
        self.inner.commit()?;
        Ok(self.effects)
    }

    // =========================================================================
    // RAW RECORDS
    // =========================================================================

    pub fn read<T: DeserializeOwned>(&mut self, key: &[u8]) -> LedgerResult<Option<T>> {
        self.inner
            .get(key)?
            .map(|bytes| decode(&bytes))
            .transpose()
            .map_err(Into::into)
    }

    pub fn read_for_update<T: DeserializeOwned>(&mut self, key: &[u8]) -> LedgerResult<Option<T>> {
        self.inner
            .get_for_update(key)?
            .map(|bytes| decode(&bytes))
            .transpose()
            .map_err(Into::into)
    }

    pub fn write<T: Serialize>(&mut self, key: &[u8], value: &T) -> LedgerResult<()> {
        let bytes = encode(value)?;
        self.inner.put(key, &bytes)?;
        Ok(())
    }

    pub fn delete(&mut self, key: &[u8]) -> LedgerResult<()> {
        self.inner.delete(key)?;
        Ok(())
    }

    // =========================================================================
    // ACCOUNTS
    // =========================================================================

    /// Lock an account row, starting a fresh one if absent. A fresh row is
    /// only persisted by `save_account`.
    pub fn lock_account(&mut self, address: &WalletAddress) -> LedgerResult<LockedAccount> {
        let stored: Option<Account> = self.read_for_update(&keys::account(address))?;
        Ok(match stored {
            Some(account) => {
                let rank_key = keys::rank(account.points, account.total_claims, address);
                LockedAccount {
                    account,
                    rank_key: Some(rank_key),
                }
            }
            None => LockedAccount {
                account: Account::new(address.clone(), self.now),
                rank_key: None,
            },
        })
    }

    /// Persist an account and move its leaderboard key if the score changed.
    pub fn save_account(&mut self, locked: &mut LockedAccount) -> LedgerResult<()> {
        let account = &mut locked.account;
        account.updated_at = self.now;

        let new_rank = keys::rank(account.points, account.total_claims, &account.address);
        if locked.rank_key.as_deref() != Some(new_rank.as_slice()) {
            if let Some(old) = locked.rank_key.take() {
                self.inner.delete(&old)?;
            }
            self.inner.put(&new_rank, &[])?;
            locked.rank_key = Some(new_rank);
        }

        let bytes = encode(&locked.account)?;
        self.inner.put(&keys::account(&locked.account.address), &bytes)?;
        self.effects.touch(&locked.account.address);
        Ok(())
    }

    // =========================================================================
    // CREDITING
    // =========================================================================

    /// Lock the task's idempotency marker and report whether it is set.
    /// Kinds without a key are never "recorded".
    pub fn is_recorded(&mut self, address: &WalletAddress, task: &TaskKind) -> LedgerResult<bool> {
        match task.idempotency_key() {
            Some(key) => Ok(self
                .inner
                .get_for_update(&keys::idempotency(address, &key))?
                .is_some()),
            None => Ok(false),
        }
    }

    /// Append an audit row and apply `points` to the locked account. The
    /// caller checks `is_recorded` first and saves the account afterwards.
    pub fn append_credit(
        &mut self,
        locked: &mut LockedAccount,
        task: &TaskKind,
        points: i64,
        note: Option<String>,
    ) -> LedgerResult<u64> {
        if points < 0 && !task.allows_negative() {
            return Err(LedgerError::invalid(format!(
                "{} cannot carry a negative amount",
                task.tag()
            )));
        }

        let account = &mut locked.account;
        let new_balance = if points >= 0 {
            account.points.checked_add(points.unsigned_abs()).ok_or_else(|| {
                LedgerError::InvariantViolation {
                    message: format!(
                        "{} of {} overflows balance {} of {}",
                        task.tag(),
                        points,
                        account.points,
                        account.address
                    ),
                }
            })?
        } else {
            account.points.checked_sub(points.unsigned_abs()).ok_or_else(|| {
                LedgerError::invalid(format!(
                    "{} of {} would take balance {} below zero",
                    task.tag(),
                    points,
                    account.points
                ))
            })?
        };

        // the next sequence slot must be free or the trail and the counter
        // have diverged
        let seq = account.audit_count;
        let audit_key = keys::audit(&account.address, seq);
        if self.inner.get(&audit_key)?.is_some() {
            return Err(LedgerError::InvariantViolation {
                message: format!(
                    "audit row {seq} of {} already exists",
                    account.address
                ),
            });
        }
        let entry = AuditEntry {
            seq,
            address: account.address.clone(),
            points_awarded: points,
            task: task.clone(),
            task_type: task.tag(),
            note,
            created_at: self.now,
        };
        let address = account.address.clone();
        self.write(&audit_key, &entry)?;
        if let Some(key) = task.idempotency_key() {
            self.write(&keys::idempotency(&address, &key), &seq)?;
        }

        let account = &mut locked.account;
        account.points = new_balance;
        account.audit_count = seq + 1;

        self.effects.credits.push((task.family(), points));
        self.effects.events.push(LedgerEvent::PointsCredited {
            event_id: Uuid::new_v4(),
            address,
            task: entry.task_type,
            points,
            new_balance,
            at: self.now,
        });
        Ok(new_balance)
    }

    // =========================================================================
    // STREAKS
    // =========================================================================

    pub fn lock_streak(
        &mut self,
        address: &WalletAddress,
        streak: StreakType,
    ) -> LedgerResult<Option<StreakState>> {
        self.read_for_update(&keys::streak(address, streak))
    }

    pub fn save_streak(
        &mut self,
        address: &WalletAddress,
        streak: StreakType,
        state: &StreakState,
    ) -> LedgerResult<()> {
        self.write(&keys::streak(address, streak), state)?;
        self.effects.events.push(LedgerEvent::StreakAdvanced {
            address: address.clone(),
            streak,
            current: state.current_streak,
            day: state.last_action_date,
        });
        Ok(())
    }
}
