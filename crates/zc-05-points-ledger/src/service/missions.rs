//! Mission registry, completion and the mission status view.

use shared_types::{Clock, StreakType, TaskKind, WalletAddress};
use tracing::info;
use zc_01_ledger_store::{decode, keys, KeyValueStore};
use zc_02_streak_engine::StreakState;
use zug_telemetry::log_credit_event;

use super::{signed, LedgerService, COMPONENT};
use crate::domain::mission::{Mission, MissionDraft, MissionUpdate};
use crate::domain::views::{MissionOutcome, MissionStatus, MissionStatusEntry};
use crate::error::{LedgerError, LedgerResult};

fn validate_draft(draft: &MissionDraft) -> LedgerResult<()> {
    if draft.title.trim().is_empty() {
        return Err(LedgerError::invalid("mission title is required"));
    }
    Ok(())
}

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    // =========================================================================
    // ADMIN
    // =========================================================================

    pub fn create_mission(&self, draft: MissionDraft) -> LedgerResult<Mission> {
        validate_draft(&draft)?;
        let mission = self.in_txn("create_mission", |txn| {
            let id = txn
                .read_for_update::<u64>(keys::MISSION_SEQ)?
                .unwrap_or(0)
                + 1;
            txn.write(keys::MISSION_SEQ, &id)?;
            let mission = Mission {
                id,
                kind: draft.kind,
                title: draft.title.clone(),
                description: draft.description.clone(),
                reward_points: draft.reward_points,
                verification: draft.verification.clone(),
                is_active: true,
                created_at: txn.now(),
            };
            txn.write(&keys::mission(id), &mission)?;
            Ok(mission)
        })?;
        info!(component = COMPONENT, mission_id = mission.id, title = %mission.title, "Mission created");
        Ok(mission)
    }

    pub fn update_mission(&self, id: u64, update: MissionUpdate) -> LedgerResult<Mission> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(LedgerError::invalid("mission title is required"));
        }
        self.in_txn("update_mission", |txn| {
            let mut mission: Mission = txn
                .read_for_update(&keys::mission(id))?
                .ok_or_else(|| LedgerError::MissionNotFound { id: id.to_string() })?;
            update.clone().apply(&mut mission);
            txn.write(&keys::mission(id), &mission)?;
            Ok(mission)
        })
    }

    pub fn set_mission_active(&self, id: u64, is_active: bool) -> LedgerResult<Mission> {
        self.in_txn("set_mission_active", |txn| {
            let mut mission: Mission = txn
                .read_for_update(&keys::mission(id))?
                .ok_or_else(|| LedgerError::MissionNotFound { id: id.to_string() })?;
            mission.is_active = is_active;
            txn.write(&keys::mission(id), &mission)?;
            Ok(mission)
        })
    }

    /// Missions in id order.
    pub fn list_missions(&self, include_inactive: bool) -> LedgerResult<Vec<Mission>> {
        let mut missions = Vec::new();
        for (_, value) in self.store.scan_prefix(keys::MISSION_PREFIX, None)? {
            let mission: Mission = decode(&value)?;
            if include_inactive || mission.is_active {
                missions.push(mission);
            }
        }
        Ok(missions)
    }

    // =========================================================================
    // COMPLETION
    // =========================================================================

    /// Credit a mission once per address. `task_id` is the mission id.
    pub fn complete_mission(
        &self,
        address: &WalletAddress,
        task_id: &str,
    ) -> LedgerResult<MissionOutcome> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(LedgerError::MissingTaskId);
        }
        let id: u64 = task_id.parse().map_err(|_| LedgerError::MissionNotFound {
            id: task_id.to_string(),
        })?;

        let outcome = self.in_txn("complete_mission", |txn| {
            let mut locked = txn.lock_account(address)?;
            let mission: Mission = txn
                .read(&keys::mission(id))?
                .ok_or_else(|| LedgerError::MissionNotFound { id: id.to_string() })?;
            if !mission.is_active {
                return Err(LedgerError::MissionInactive { id });
            }

            let task = TaskKind::Mission {
                kind: mission.kind,
                id,
            };
            if txn.is_recorded(address, &task)? {
                txn.effects.duplicates.push(task.family());
                return Ok(MissionOutcome {
                    credited: false,
                    points_awarded: 0,
                    new_balance: locked.account.points,
                });
            }

            let amount = locked.account.multiplier.apply(mission.reward_points);
            let new_balance = txn.append_credit(&mut locked, &task, signed(amount), None)?;
            txn.save_account(&mut locked)?;
            Ok(MissionOutcome {
                credited: true,
                points_awarded: amount,
                new_balance,
            })
        })
        .map_err(|e| {
            let attempted = self
                .store
                .get(&keys::mission(id))
                .ok()
                .flatten()
                .and_then(|bytes| decode::<Mission>(&bytes).ok())
                .map_or(0, |m| signed(m.reward_points));
            self.credit_failed(address, &format!("MISSION:{id}"), attempted, e)
        })?;

        if outcome.credited {
            log_credit_event!(
                info,
                COMPONENT,
                "Mission completed",
                address,
                "MISSION",
                outcome.points_awarded,
                mission_id = id
            );
        }
        Ok(outcome)
    }

    /// Active missions with completion flags and both streaks.
    ///
    /// Awards today's weekly streak bonus first when the address qualifies.
    pub fn get_mission_status(&self, address: &WalletAddress) -> LedgerResult<MissionStatus> {
        let weekly_bonus = self.claim_weekly_bonus(address)?;
        let today = self.clock.today();

        let mut missions = Vec::new();
        for mission in self.list_missions(false)? {
            let task = TaskKind::Mission {
                kind: mission.kind,
                id: mission.id,
            };
            let completed = match task.idempotency_key() {
                Some(key) => self.store.get(&keys::idempotency(address, &key))?.is_some(),
                None => false,
            };
            missions.push(MissionStatusEntry { mission, completed });
        }

        let streak = |kind: StreakType| -> LedgerResult<u32> {
            let state: Option<StreakState> = self
                .store
                .get(&keys::streak(address, kind))?
                .map(|bytes| decode(&bytes))
                .transpose()?;
            Ok(self.streaks.effective_streak(state.as_ref(), today))
        };

        Ok(MissionStatus {
            missions,
            faucet_streak: streak(StreakType::Faucet)?,
            stake_streak: streak(StreakType::Stake)?,
            has_pending_notification: self
                .get_account(address)?
                .is_some_and(|a| a.has_pending_notification),
            weekly_bonus,
        })
    }
}
