//! Referral registration, bonus distribution and referral stats.
//!
//! Registration and payment are separate steps. Registering a code moves no
//! points. The bonus is paid when the referee first claims the faucet: the
//! link's paid flag is flipped under its row lock in the same transaction
//! that credits both parties, so concurrent attempts pay exactly once.

use shared_bus::LedgerEvent;
use shared_types::{Clock, ContractKind, Multiplier, TaskKind, WalletAddress};
use tracing::info;
use zc_01_ledger_store::{decode, keys, KeyValueStore};
use zc_03_referral_tiers::{generate_referral_code, is_well_formed_code};
use zc_04_read_cache::{CacheKey, ReadCacheExt};
use zug_telemetry::log_event;

use super::{signed, LedgerService, COMPONENT};
use crate::domain::referral::ReferralLink;
use crate::domain::views::{
    BonusOutcome, ReferralOverview, ReferralStats, RegisterOutcome, TierView,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger_txn::{LedgerTxn, LockedAccount};

const MAX_CODE_ATTEMPTS: usize = 8;

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Link `referee` to the owner of `code`. A referee that already has a
    /// link keeps it and the call is a no-op.
    pub fn register_referral_link(
        &self,
        referee: &WalletAddress,
        code: &str,
    ) -> LedgerResult<RegisterOutcome> {
        let outcome = self.in_txn("register_referral_link", |txn| {
            let mut locked = txn.lock_account(referee)?;
            let outcome = self.register_in(txn, &mut locked, code)?;
            if matches!(outcome, RegisterOutcome::Registered { .. }) {
                txn.save_account(&mut locked)?;
            }
            Ok(outcome)
        })?;

        if let RegisterOutcome::Registered { referrer } = &outcome {
            log_event!(
                info,
                COMPONENT,
                "Referral registered",
                referee = %referee,
                referrer = %referrer
            );
        }
        Ok(outcome)
    }

    pub(super) fn register_in(
        &self,
        txn: &mut LedgerTxn<'_>,
        referee: &mut LockedAccount,
        code: &str,
    ) -> LedgerResult<RegisterOutcome> {
        let referee_address = referee.account.address.clone();
        let canonical = code.trim().to_ascii_uppercase();
        let invalid = || LedgerError::InvalidReferralCode {
            code: code.to_string(),
        };

        // an existing link wins over anything about the presented code
        let link_key = keys::referral_link(&referee_address);
        if let Some(existing) = txn.read_for_update::<ReferralLink>(&link_key)? {
            return Ok(RegisterOutcome::AlreadyLinked {
                referrer: existing.referrer,
            });
        }

        if !is_well_formed_code(&canonical) {
            return Err(invalid());
        }
        let referrer: WalletAddress = txn
            .read(&keys::referral_code(&canonical))?
            .ok_or_else(invalid)?;
        if referrer == referee_address {
            return Err(LedgerError::SelfReferral);
        }

        let link = ReferralLink::new(
            referrer.clone(),
            referee_address.clone(),
            canonical.clone(),
            txn.now(),
        );
        txn.write(&link_key, &link)?;
        txn.write(
            &keys::referee_index(&referrer, &referee_address),
            &referee_address,
        )?;
        referee.account.referred_by = Some(referrer.clone());

        txn.effects.touch(&referrer);
        txn.effects.events.push(LedgerEvent::ReferralRegistered {
            referrer: referrer.clone(),
            referee: referee_address,
            code: canonical,
        });
        Ok(RegisterOutcome::Registered { referrer })
    }

    /// Pay a pending faucet referral bonus for `referee`, if any.
    pub fn distribute_referral_bonus(&self, referee: &WalletAddress) -> LedgerResult<BonusOutcome> {
        self.in_txn("distribute_referral_bonus", |txn| {
            let mut locked = txn.lock_account(referee)?;
            let outcome = self.distribute_in(txn, &mut locked)?;
            if outcome.paid {
                txn.save_account(&mut locked)?;
            }
            Ok(outcome)
        })
    }

    /// Flip the link's faucet flag and credit both sides. The referee row
    /// is already locked; the caller saves it.
    pub(super) fn distribute_in(
        &self,
        txn: &mut LedgerTxn<'_>,
        referee: &mut LockedAccount,
    ) -> LedgerResult<BonusOutcome> {
        let referee_address = referee.account.address.clone();
        let link_key = keys::referral_link(&referee_address);
        let Some(mut link) = txn.read_for_update::<ReferralLink>(&link_key)? else {
            return Ok(BonusOutcome::default());
        };
        if link.faucet_bonus_paid {
            return Ok(BonusOutcome::default());
        }
        link.faucet_bonus_paid = true;
        txn.write(&link_key, &link)?;

        let rewards = &self.config.rewards;
        let welcome = TaskKind::ReferralWelcome;
        let referee_points = if txn.is_recorded(&referee_address, &welcome)? {
            0
        } else {
            txn.append_credit(referee, &welcome, signed(rewards.referral_welcome), None)?;
            rewards.referral_welcome
        };

        let reward = TaskKind::ReferralRewardFaucet {
            referee: referee_address.clone(),
        };
        let mut referrer = txn.lock_account(&link.referrer)?;
        let referrer_points = if txn.is_recorded(&link.referrer, &reward)? {
            0
        } else {
            let points = rewards.referral_reward_faucet;
            txn.append_credit(&mut referrer, &reward, signed(points), None)?;
            referrer.account.referral_points += points;
            points
        };
        txn.save_account(&mut referrer)?;

        txn.effects.referral_bonuses.push("faucet");
        txn.effects.events.push(LedgerEvent::ReferralBonusPaid {
            referrer: link.referrer.clone(),
            referee: referee_address,
            referee_points,
            referrer_points,
        });
        Ok(BonusOutcome {
            paid: true,
            referee_points,
            referrer_points,
        })
    }

    /// Flip the link's stake flag for `contract` on the referee's first
    /// qualifying stake there. Returns the referrer reward if flipped.
    pub(super) fn stake_bonus_in(
        &self,
        txn: &mut LedgerTxn<'_>,
        referee: &WalletAddress,
        contract: ContractKind,
    ) -> LedgerResult<Option<u64>> {
        let link_key = keys::referral_link(referee);
        let Some(mut link) = txn.read_for_update::<ReferralLink>(&link_key)? else {
            return Ok(None);
        };
        if link.stake_bonus_paid(contract) {
            return Ok(None);
        }
        link.mark_stake_bonus_paid(contract);
        txn.write(&link_key, &link)?;

        let points = self.config.rewards.referral_reward_stake;
        let mut referrer = txn.lock_account(&link.referrer)?;
        let task = TaskKind::ReferralRewardStake {
            referee: referee.clone(),
            contract,
        };
        let mut credited = 0;
        if points > 0 && !txn.is_recorded(&link.referrer, &task)? {
            txn.append_credit(&mut referrer, &task, signed(points), None)?;
            referrer.account.referral_points += points;
            credited = points;
        }
        txn.save_account(&mut referrer)?;

        txn.effects.referral_bonuses.push("stake");
        txn.effects.events.push(LedgerEvent::ReferralBonusPaid {
            referrer: link.referrer,
            referee: referee.clone(),
            referee_points: 0,
            referrer_points: credited,
        });
        Ok(Some(credited))
    }

    /// Referral code, link, counters and tier progress for `address`.
    ///
    /// Creates the address's code on first call and raises the stored
    /// multiplier when the resolved tier pays more. Never lowers it.
    pub fn get_referral_stats(&self, address: &WalletAddress) -> LedgerResult<ReferralOverview> {
        let cache_key = CacheKey::ReferralStats(address.clone());
        if let Some(hit) = self.cache.get_json::<ReferralOverview>(&cache_key) {
            return Ok(hit);
        }

        let code = self.ensure_referral_code(address)?;
        let account = self.get_account(address)?;
        let xp = account.as_ref().map_or(0, |a| a.points);
        let stored = account.as_ref().map_or(Multiplier::ONE, |a| a.multiplier);
        let stats = self.referral_counts(address, account.map_or(0, |a| a.referral_points))?;

        let progress = self.config.tiers.progress(stats.verified_referrals, xp);
        let multiplier = if progress.tier.multiplier > stored {
            self.ratchet_multiplier(address, progress.tier.multiplier)?
        } else {
            stored
        };

        let overview = ReferralOverview {
            link: self.config.referral_link(&code),
            code,
            stats,
            tier: TierView::from_progress(&progress, stats.verified_referrals, xp),
            multiplier,
        };
        self.cache
            .set_json(cache_key, &overview, self.config.stats_ttl);
        Ok(overview)
    }

    /// The address's referral code, allocated on first use.
    pub fn ensure_referral_code(&self, address: &WalletAddress) -> LedgerResult<String> {
        if let Some(bytes) = self.store.get(&keys::referral_code_owner(address))? {
            return Ok(decode(&bytes)?);
        }

        self.in_txn("create_referral_code", |txn| {
            let owner_key = keys::referral_code_owner(address);
            if let Some(code) = txn.read_for_update::<String>(&owner_key)? {
                return Ok(code);
            }
            for _ in 0..MAX_CODE_ATTEMPTS {
                let code = generate_referral_code(&mut rand::thread_rng());
                let code_key = keys::referral_code(&code);
                if txn.read_for_update::<WalletAddress>(&code_key)?.is_some() {
                    continue;
                }
                txn.write(&code_key, address)?;
                txn.write(&owner_key, &code)?;
                return Ok(code);
            }
            Err(LedgerError::Internal {
                message: "could not allocate a unique referral code".to_string(),
            })
        })
    }

    fn referral_counts(
        &self,
        referrer: &WalletAddress,
        referral_points: u64,
    ) -> LedgerResult<ReferralStats> {
        let mut stats = ReferralStats {
            points_earned: referral_points,
            ..ReferralStats::default()
        };
        for (_, value) in self
            .store
            .scan_prefix(&keys::referee_index_prefix(referrer), None)?
        {
            let referee: WalletAddress = decode(&value)?;
            let Some(bytes) = self.store.get(&keys::referral_link(&referee))? else {
                continue;
            };
            let link: ReferralLink = decode(&bytes)?;
            stats.total_referrals += 1;
            if link.is_verified() {
                stats.verified_referrals += 1;
            }
            if link.is_active_staker() {
                stats.active_stakers += 1;
            }
        }
        Ok(stats)
    }

    fn ratchet_multiplier(
        &self,
        address: &WalletAddress,
        resolved: Multiplier,
    ) -> LedgerResult<Multiplier> {
        let (previous, current) = self.in_txn("ratchet_multiplier", |txn| {
            let mut locked = txn.lock_account(address)?;
            let previous = locked.account.multiplier;
            if resolved <= previous {
                return Ok((previous, previous));
            }
            locked.account.multiplier = resolved;
            txn.save_account(&mut locked)?;
            Ok((previous, resolved))
        })?;
        if current != previous {
            info!(
                component = COMPONENT,
                address = %address,
                from = %previous,
                to = %current,
                "Multiplier raised"
            );
        }
        Ok(current)
    }
}
