//! Crediting paths: generic credit, faucet, on-chain actions, weekly bonus.

use shared_types::{
    seconds_until_next_utc_day, Clock, OnChainAction, StreakType, TaskKind, TxHash, WalletAddress,
};
use shared_bus::LedgerEvent;
use tracing::debug;
use zc_01_ledger_store::{keys, KeyValueStore};
use zc_02_streak_engine::{StreakState, WeeklyEligibility};
use zug_telemetry::{component_span, log_credit_event, log_event};

use super::{signed, LedgerService, COMPONENT};
use crate::domain::account::{Account, FaucetClaimRecord};
use crate::domain::views::{BonusOutcome, CreditOutcome, FaucetClaimOutcome, WeeklyBonusOutcome};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger_txn::LedgerTxn;

fn eligibility_label(eligibility: WeeklyEligibility) -> &'static str {
    match eligibility {
        WeeklyEligibility::Eligible => "ELIGIBLE",
        WeeklyEligibility::StreakTooShort { .. } => "STREAK_TOO_SHORT",
        WeeklyEligibility::Stale => "STALE",
        WeeklyEligibility::AlreadyAwarded => "ALREADY_AWARDED",
    }
}

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// `floor(base * multiplier)` for boosted kinds, the literal amount
    /// for bonus kinds.
    pub(super) fn reward_for(&self, account: &Account, task: &TaskKind, base: i64) -> i64 {
        if task.is_boostable() && base > 0 {
            signed(account.multiplier.apply(base.unsigned_abs()))
        } else {
            base
        }
    }

    /// Boosted amount for `base` at the address's committed multiplier.
    pub fn calculate_reward(&self, base_amount: u64, address: &WalletAddress) -> LedgerResult<u64> {
        let multiplier = self
            .get_account(address)?
            .map(|a| a.multiplier)
            .unwrap_or_default();
        Ok(multiplier.apply(base_amount))
    }

    /// Credit one event exactly once.
    ///
    /// One-shot kinds are deduplicated on their idempotency key; a replay
    /// returns `credited: false` and leaves the balance alone. Faucet claims
    /// go through the UTC-day cooldown instead.
    pub fn credit_event(
        &self,
        address: &WalletAddress,
        task: TaskKind,
        base_amount: i64,
    ) -> LedgerResult<CreditOutcome> {
        match task {
            TaskKind::FaucetClaim => {
                let base = u64::try_from(base_amount)
                    .map_err(|_| LedgerError::invalid("faucet amount must not be negative"))?;
                let claim = self.faucet_claim(address, None, base)?;
                return Ok(CreditOutcome {
                    credited: claim.allowed,
                    final_amount: signed(claim.points_awarded.unwrap_or(0)),
                    new_balance: claim.new_balance,
                });
            }
            TaskKind::MultiplierOverride => {
                return Err(LedgerError::invalid(
                    "multiplier changes go through override_multiplier",
                ));
            }
            _ => {}
        }
        if base_amount < 0 && !task.allows_negative() {
            return Err(LedgerError::invalid(format!(
                "{} cannot carry a negative amount",
                task.tag()
            )));
        }

        let outcome = self.in_txn("credit_event", |txn| {
            let mut locked = txn.lock_account(address)?;
            if txn.is_recorded(address, &task)? {
                txn.effects.duplicates.push(task.family());
                return Ok(CreditOutcome {
                    credited: false,
                    final_amount: 0,
                    new_balance: locked.account.points,
                });
            }
            let amount = self.reward_for(&locked.account, &task, base_amount);
            let new_balance = txn.append_credit(&mut locked, &task, amount, None)?;
            txn.save_account(&mut locked)?;
            Ok(CreditOutcome {
                credited: true,
                final_amount: amount,
                new_balance,
            })
        })
        .map_err(|e| self.credit_failed(address, &task, base_amount, e))?;

        if outcome.credited {
            log_credit_event!(info, COMPONENT, "Points credited", address, task, outcome.final_amount);
        } else {
            debug!(component = COMPONENT, address = %address, task = %task, "Duplicate credit ignored");
        }
        Ok(outcome)
    }

    /// Credit a non-stake on-chain action, once per transaction hash.
    pub fn record_on_chain_action(
        &self,
        address: &WalletAddress,
        action: OnChainAction,
        tx_hash: TxHash,
    ) -> LedgerResult<CreditOutcome> {
        let base = self.config.rewards.on_chain(action);
        self.credit_event(address, TaskKind::OnChain { action, tx: tx_hash }, signed(base))
    }

    /// Daily faucet claim.
    ///
    /// One claim per UTC day. An allowed claim advances the FAUCET streak,
    /// credits the boosted faucet reward and, on the address's first ever
    /// claim, pays a pending referral bonus. A referral code presented with
    /// the claim is registered first; an unusable code is ignored.
    pub fn record_faucet_claim(
        &self,
        address: &WalletAddress,
        referral_code: Option<&str>,
    ) -> LedgerResult<FaucetClaimOutcome> {
        self.faucet_claim(address, referral_code, self.config.rewards.faucet_claim)
    }

    fn faucet_claim(
        &self,
        address: &WalletAddress,
        referral_code: Option<&str>,
        base: u64,
    ) -> LedgerResult<FaucetClaimOutcome> {
        let _span = component_span!("faucet_claim", component = COMPONENT, address = %address).entered();

        let outcome = self.in_txn("faucet_claim", |txn| {
            let mut locked = txn.lock_account(address)?;
            let today = txn.today();
            let claimed_today: Option<FaucetClaimRecord> =
                txn.read_for_update(&keys::faucet_claim(address, today))?;
            let previous = txn.lock_streak(address, StreakType::Faucet)?;

            let on_cooldown = claimed_today.is_some()
                || previous
                    .as_ref()
                    .is_some_and(|s| s.last_action_date >= today);
            if on_cooldown {
                txn.effects.cooldown_rejections += 1;
                return Ok(FaucetClaimOutcome {
                    allowed: false,
                    cooldown_seconds_remaining: Some(seconds_until_next_utc_day(txn.now())),
                    points_awarded: None,
                    faucet_streak: previous.map_or(0, |s| s.current_streak),
                    referral_bonus_paid: false,
                    new_balance: locked.account.points,
                });
            }

            if let Some(code) = referral_code {
                match self.register_in(txn, &mut locked, code) {
                    Ok(_) => {}
                    Err(e) if e.is_retryable() => return Err(e),
                    Err(e) => log_event!(
                        warn,
                        COMPONENT,
                        "Ignoring referral code presented with faucet claim",
                        address = %address,
                        code = %code,
                        reason = e.code()
                    ),
                }
            }

            let (state, transition) = self.streaks.advance(previous.as_ref(), txn.now());
            if transition.changed() {
                txn.save_streak(address, StreakType::Faucet, &state)?;
            }

            let first_claim = locked.account.total_claims == 0;
            let amount = locked.account.multiplier.apply(base);
            locked.account.total_claims += 1;
            txn.append_credit(&mut locked, &TaskKind::FaucetClaim, signed(amount), None)?;
            let record = FaucetClaimRecord {
                day: today,
                points: amount,
                claimed_at: txn.now(),
            };
            txn.write(&keys::faucet_claim(address, today), &record)?;

            let bonus = if first_claim {
                self.distribute_in(txn, &mut locked)?
            } else {
                BonusOutcome::default()
            };
            txn.save_account(&mut locked)?;

            Ok(FaucetClaimOutcome {
                allowed: true,
                cooldown_seconds_remaining: None,
                points_awarded: Some(amount),
                faucet_streak: state.current_streak,
                referral_bonus_paid: bonus.paid,
                new_balance: locked.account.points,
            })
        })
        .map_err(|e| self.credit_failed(address, &"FAUCET_CLAIM", signed(base), e))?;

        if let Some(points) = outcome.points_awarded {
            log_credit_event!(
                info,
                COMPONENT,
                "Faucet claim credited",
                address,
                "FAUCET_CLAIM",
                points,
                streak = outcome.faucet_streak,
                referral_bonus = outcome.referral_bonus_paid
            );
        } else {
            debug!(
                component = COMPONENT,
                address = %address,
                cooldown_secs = outcome.cooldown_seconds_remaining,
                "Faucet claim on cooldown"
            );
        }
        Ok(outcome)
    }

    /// Award today's weekly streak bonus if eligible.
    pub fn claim_weekly_bonus(&self, address: &WalletAddress) -> LedgerResult<WeeklyBonusOutcome> {
        let outcome = self
            .in_txn("claim_weekly_bonus", |txn| self.weekly_in(txn, address))
            .map_err(|e| {
                let attempted = signed(self.config.rewards.weekly_streak_bonus);
                self.credit_failed(address, &"WEEKLY_STREAK_BONUS", attempted, e)
            })?;
        if outcome.awarded {
            log_credit_event!(
                info,
                COMPONENT,
                "Weekly streak bonus awarded",
                address,
                "WEEKLY_STREAK_BONUS",
                outcome.points
            );
        }
        Ok(outcome)
    }

    pub(super) fn weekly_in(
        &self,
        txn: &mut LedgerTxn<'_>,
        address: &WalletAddress,
    ) -> LedgerResult<WeeklyBonusOutcome> {
        let mut locked = txn.lock_account(address)?;
        let today = txn.today();
        let faucet: Option<StreakState> = txn.read(&keys::streak(address, StreakType::Faucet))?;
        let stake: Option<StreakState> = txn.read(&keys::streak(address, StreakType::Stake))?;
        let task = TaskKind::WeeklyStreakBonus { day: today };
        let already_awarded = txn.is_recorded(address, &task)?;

        let eligibility = self
            .weekly
            .evaluate(faucet.as_ref(), stake.as_ref(), today, already_awarded);
        if !eligibility.is_eligible() {
            return Ok(WeeklyBonusOutcome {
                awarded: false,
                points: 0,
                status: eligibility_label(eligibility).to_string(),
            });
        }

        let points = self.config.rewards.weekly_streak_bonus;
        txn.append_credit(&mut locked, &task, signed(points), None)?;
        locked.account.has_pending_notification = true;
        txn.save_account(&mut locked)?;
        txn.effects.events.push(LedgerEvent::WeeklyBonusAwarded {
            address: address.clone(),
            day: today,
            points,
        });
        Ok(WeeklyBonusOutcome {
            awarded: true,
            points,
            status: eligibility_label(eligibility).to_string(),
        })
    }

    /// Clear the pending-notification flag. Returns whether it was set.
    pub fn acknowledge_notification(&self, address: &WalletAddress) -> LedgerResult<bool> {
        self.in_txn("acknowledge_notification", |txn| {
            let mut locked = txn.lock_account(address)?;
            if !locked.exists() || !locked.account.has_pending_notification {
                return Ok(false);
            }
            locked.account.has_pending_notification = false;
            txn.save_account(&mut locked)?;
            Ok(true)
        })
    }
}
