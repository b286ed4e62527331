//! # Ledger Service Tests

use super::*;
use crate::domain::mission::{MissionDraft, MissionUpdate};
use crate::domain::stake::StakeEvent;
use crate::domain::views::RegisterOutcome;
use crate::test_utils::MockSocialVerifier;
use crate::ports::VerifierError;
use chrono::{Duration, TimeZone, Utc};
use shared_bus::{EventFilter, InMemoryEventBus, LedgerEvent};
use shared_types::{
    ContractKind, ManualClock, MissionKind, Multiplier, OnChainAction, SocialPlatform,
    StakeEventType, TaskKind, TxHash,
};
use zc_01_ledger_store::InMemoryKvStore;
use zc_04_read_cache::LruReadCache;

type TestService = LedgerService<InMemoryKvStore, Arc<ManualClock>>;

fn make_test_service() -> (TestService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    ));
    let service = LedgerService::new(
        InMemoryKvStore::new(),
        Arc::clone(&clock),
        LedgerConfig::for_testing(),
    );
    (service, clock)
}

fn addr(n: u8) -> WalletAddress {
    WalletAddress::parse(&format!("0x{:040x}", n)).unwrap()
}

fn tx(n: u64) -> TxHash {
    TxHash::parse(&format!("0x{:064x}", n)).unwrap()
}

fn stake_event(address: &WalletAddress, n: u64, event_type: StakeEventType) -> StakeEvent {
    StakeEvent {
        address: address.clone(),
        tx_hash: tx(n),
        event_type,
        contract: ContractKind::Native,
        amount_wei: 1_000_000_000_000_000_000,
        harvested_yield_wei: None,
        block_number: 100 + n,
        deposit_id: Some(n),
        tier_id: Some(1),
    }
}

fn balance(service: &TestService, address: &WalletAddress) -> u64 {
    service.get_account(address).unwrap().map_or(0, |a| a.points)
}

fn assert_reconciles(service: &TestService, address: &WalletAddress) {
    let report = service.reconcile(address).unwrap();
    assert!(report.is_consistent(), "{report:?}");
}

// =============================================================================
// FAUCET
// =============================================================================

#[test]
fn test_faucet_claim_cooldown_and_next_day() {
    let (service, clock) = make_test_service();
    let user = addr(1);

    let first = service.record_faucet_claim(&user, None).unwrap();
    assert!(first.allowed);
    assert_eq!(first.points_awarded, Some(25));
    assert_eq!(first.faucet_streak, 1);
    assert_eq!(first.new_balance, 25);

    let again = service.record_faucet_claim(&user, None).unwrap();
    assert!(!again.allowed);
    assert_eq!(again.cooldown_seconds_remaining, Some(14 * 3600));
    assert_eq!(again.points_awarded, None);
    assert_eq!(again.new_balance, 25);

    clock.advance_to_next_day(Duration::hours(1));
    let next = service.record_faucet_claim(&user, None).unwrap();
    assert!(next.allowed);
    assert_eq!(next.faucet_streak, 2);
    assert_eq!(next.new_balance, 50);

    let account = service.get_account(&user).unwrap().unwrap();
    assert_eq!(account.total_claims, 2);
    assert_reconciles(&service, &user);
}

#[test]
fn test_faucet_claim_at_day_boundary() {
    let (service, clock) = make_test_service();
    let user = addr(1);
    clock.set(Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap());
    assert!(service.record_faucet_claim(&user, None).unwrap().allowed);

    clock.advance(Duration::minutes(2));
    let outcome = service.record_faucet_claim(&user, None).unwrap();
    assert!(outcome.allowed);
    assert_eq!(outcome.faucet_streak, 2);
}

#[test]
fn test_faucet_claim_clock_rewind_is_cooldown() {
    let (service, clock) = make_test_service();
    let user = addr(1);
    assert!(service.record_faucet_claim(&user, None).unwrap().allowed);

    clock.advance(-Duration::days(2));
    assert!(!service.record_faucet_claim(&user, None).unwrap().allowed);
}

#[test]
fn test_concurrent_faucet_claims_pay_once() {
    let (service, _clock) = make_test_service();
    let service = Arc::new(service);
    let user = addr(1);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let user = user.clone();
            std::thread::spawn(move || service.record_faucet_claim(&user, None).unwrap())
        })
        .collect();
    let allowed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| o.allowed)
        .count();

    assert_eq!(allowed, 1);
    assert_eq!(balance(&service, &user), 25);
    assert_reconciles(&service, &user);
}

// =============================================================================
// GENERIC CREDIT
// =============================================================================

#[test]
fn test_credit_event_deduplicates_on_tx() {
    let (service, _clock) = make_test_service();
    let user = addr(1);

    let first = service
        .record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(7))
        .unwrap();
    assert!(first.credited);
    assert_eq!(first.final_amount, 15);

    let replay = service
        .record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(7))
        .unwrap();
    assert!(!replay.credited);
    assert_eq!(replay.new_balance, 15);
    assert_eq!(service.get_audit_log(&user).unwrap().len(), 1);
}

#[test]
fn test_credit_event_routes_faucet_and_rejects_override() {
    let (service, _clock) = make_test_service();
    let user = addr(1);

    let outcome = service.credit_event(&user, TaskKind::FaucetClaim, 25).unwrap();
    assert!(outcome.credited);
    let outcome = service.credit_event(&user, TaskKind::FaucetClaim, 25).unwrap();
    assert!(!outcome.credited);

    let err = service
        .credit_event(&user, TaskKind::MultiplierOverride, 0)
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENT");

    let err = service
        .credit_event(&user, TaskKind::ReferralWelcome, -10)
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENT");
}

#[test]
fn test_calculate_reward_uses_multiplier() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    assert_eq!(service.calculate_reward(25, &user).unwrap(), 25);

    service
        .override_multiplier(&user, Multiplier::from_bps(15_000).unwrap(), "promo")
        .unwrap();
    assert_eq!(service.calculate_reward(25, &user).unwrap(), 37);
}

#[test]
fn test_commit_failure_rolls_back() {
    let (service, _clock) = make_test_service();
    let user = addr(1);

    service.store().fail_next_commits(1);
    let err = service.record_faucet_claim(&user, None).unwrap_err();
    assert_eq!(err.code(), "STORAGE_FAILURE");
    assert!(service.get_account(&user).unwrap().is_none());
    assert!(service.get_audit_log(&user).unwrap().is_empty());

    // nothing was applied, so the day is still claimable
    assert!(service.record_faucet_claim(&user, None).unwrap().allowed);
}

#[test]
fn test_failed_put_leaves_no_trace() {
    let (service, _clock) = make_test_service();
    let user = addr(1);

    service.store().fail_puts_with_prefix(Some(b"audit/"));
    assert!(service.record_faucet_claim(&user, None).is_err());
    service.store().fail_puts_with_prefix(None);

    assert_eq!(balance(&service, &user), 0);
    assert_eq!(service.store().locked_keys(), 0);
}

// =============================================================================
// REFERRALS
// =============================================================================

#[test]
fn test_referral_bonus_on_first_faucet_claim() {
    let (service, _clock) = make_test_service();
    let referrer = addr(1);
    let referee = addr(2);
    let code = service.ensure_referral_code(&referrer).unwrap();

    let claim = service.record_faucet_claim(&referee, Some(&code)).unwrap();
    assert!(claim.allowed);
    assert!(claim.referral_bonus_paid);
    assert_eq!(claim.new_balance, 75);
    assert_eq!(balance(&service, &referrer), 100);

    let referee_account = service.get_account(&referee).unwrap().unwrap();
    assert_eq!(referee_account.referred_by, Some(referrer.clone()));

    let overview = service.get_referral_stats(&referrer).unwrap();
    assert_eq!(overview.code, code);
    assert_eq!(overview.link, format!("https://zug.network/?ref={code}"));
    assert_eq!(overview.stats.total_referrals, 1);
    assert_eq!(overview.stats.verified_referrals, 1);
    assert_eq!(overview.stats.points_earned, 100);

    // a second distribution is a no-op
    let again = service.distribute_referral_bonus(&referee).unwrap();
    assert!(!again.paid);
    assert_reconciles(&service, &referrer);
    assert_reconciles(&service, &referee);
}

#[test]
fn test_referral_code_is_stable() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let code = service.ensure_referral_code(&user).unwrap();
    assert!(code.starts_with("ZUG-"));
    assert_eq!(service.ensure_referral_code(&user).unwrap(), code);
}

#[test]
fn test_register_rejects_self_and_unknown_codes() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let code = service.ensure_referral_code(&user).unwrap();

    let err = service.register_referral_link(&user, &code).unwrap_err();
    assert!(matches!(err, LedgerError::SelfReferral));

    let err = service
        .register_referral_link(&addr(2), "ZUG-NOPE2345")
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_REFERRAL_CODE");

    // unusable code on a faucet claim is ignored
    let claim = service
        .record_faucet_claim(&addr(2), Some("not a code"))
        .unwrap();
    assert!(claim.allowed);
    assert!(!claim.referral_bonus_paid);
}

#[test]
fn test_existing_link_is_kept() {
    let (service, _clock) = make_test_service();
    let first = service.ensure_referral_code(&addr(1)).unwrap();
    let second = service.ensure_referral_code(&addr(2)).unwrap();
    let referee = addr(3);

    let outcome = service.register_referral_link(&referee, &first).unwrap();
    assert_eq!(outcome, RegisterOutcome::Registered { referrer: addr(1) });

    let outcome = service.register_referral_link(&referee, &second).unwrap();
    assert_eq!(outcome, RegisterOutcome::AlreadyLinked { referrer: addr(1) });
    assert_eq!(balance(&service, &referee), 0);
}

#[test]
fn test_linked_referee_presenting_any_code_is_a_no_op() {
    let (service, _clock) = make_test_service();
    let code = service.ensure_referral_code(&addr(1)).unwrap();
    let referee = addr(3);
    service.register_referral_link(&referee, &code).unwrap();

    let own = service.ensure_referral_code(&referee).unwrap();
    let outcome = service.register_referral_link(&referee, &own).unwrap();
    assert_eq!(outcome, RegisterOutcome::AlreadyLinked { referrer: addr(1) });

    let outcome = service.register_referral_link(&referee, "not a code").unwrap();
    assert_eq!(outcome, RegisterOutcome::AlreadyLinked { referrer: addr(1) });
}

#[test]
fn test_concurrent_distribution_pays_once() {
    let (service, _clock) = make_test_service();
    let service = Arc::new(service);
    let referrer = addr(1);
    let referee = addr(2);
    let code = service.ensure_referral_code(&referrer).unwrap();
    service.register_referral_link(&referee, &code).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let referee = referee.clone();
            std::thread::spawn(move || service.distribute_referral_bonus(&referee).unwrap())
        })
        .collect();
    let paid = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| o.paid)
        .count();

    assert_eq!(paid, 1);
    assert_eq!(balance(&service, &referee), 50);
    assert_eq!(balance(&service, &referrer), 100);
}

#[test]
fn test_multiplier_ratchets_and_survives_override() {
    let (service, _clock) = make_test_service();
    let referrer = addr(1);
    let code = service.ensure_referral_code(&referrer).unwrap();
    for n in 10..20 {
        assert!(service
            .record_faucet_claim(&addr(n), Some(&code))
            .unwrap()
            .referral_bonus_paid);
    }

    let overview = service.get_referral_stats(&referrer).unwrap();
    assert_eq!(overview.tier.name, "VANGUARD");
    assert_eq!(overview.multiplier.bps(), 11_000);

    let boosted = Multiplier::from_bps(15_000).unwrap();
    let previous = service
        .override_multiplier(&referrer, boosted, "launch promo")
        .unwrap();
    assert_eq!(previous.bps(), 11_000);
    assert_eq!(service.get_referral_stats(&referrer).unwrap().multiplier, boosted);

    // an explicit downgrade is allowed, the next stats read raises it again
    service
        .override_multiplier(&referrer, Multiplier::ONE, "reset")
        .unwrap();
    assert_eq!(
        service.get_referral_stats(&referrer).unwrap().multiplier.bps(),
        11_000
    );

    let overrides = service
        .get_audit_log(&referrer)
        .unwrap()
        .into_iter()
        .filter(|e| e.task_type == "MULTIPLIER_OVERRIDE")
        .collect::<Vec<_>>();
    assert_eq!(overrides.len(), 2);
    assert!(overrides.iter().all(|e| e.points_awarded == 0));
    assert_reconciles(&service, &referrer);
}

// =============================================================================
// STAKING
// =============================================================================

#[test]
fn test_stake_event_is_idempotent() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let event = stake_event(&user, 1, StakeEventType::Staked);

    let first = service.record_stake_event(&event).unwrap();
    assert!(first.recorded);
    assert!(first.credited);
    assert_eq!(first.points_awarded, 25);
    assert_eq!(first.stake_streak, Some(1));

    let replay = service.record_stake_event(&event).unwrap();
    assert!(!replay.recorded);
    assert!(!replay.credited);
    assert_eq!(balance(&service, &user), 25);
}

#[test]
fn test_history_only_events() {
    let (service, clock) = make_test_service();
    let user = addr(1);
    service
        .record_stake_event(&stake_event(&user, 1, StakeEventType::Staked))
        .unwrap();
    clock.advance(Duration::minutes(5));
    let withdrawn = service
        .record_stake_event(&stake_event(&user, 2, StakeEventType::Withdrawn))
        .unwrap();
    assert!(withdrawn.recorded);
    assert!(!withdrawn.credited);
    assert_eq!(withdrawn.stake_streak, None);

    let history = service.get_staking_history(&user, None, None).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].event_type, StakeEventType::Withdrawn);

    let staked = service
        .get_staking_history(&user, None, Some(&[StakeEventType::Staked]))
        .unwrap();
    assert_eq!(staked.len(), 1);
    assert!(service
        .get_staking_history(&user, Some(ContractKind::Token), None)
        .unwrap()
        .is_empty());

    assert_eq!(service.get_audit_log(&user).unwrap().len(), 1);
}

#[test]
fn test_first_stake_marks_referral_active() {
    let (service, _clock) = make_test_service();
    let referrer = addr(1);
    let referee = addr(2);
    let code = service.ensure_referral_code(&referrer).unwrap();
    service.register_referral_link(&referee, &code).unwrap();

    service
        .record_stake_event(&stake_event(&referee, 1, StakeEventType::Staked))
        .unwrap();
    let stats = service.get_referral_stats(&referrer).unwrap().stats;
    assert_eq!(stats.total_referrals, 1);
    assert_eq!(stats.active_stakers, 1);
    // a settled stake bonus verifies the referee without any faucet claim
    assert_eq!(stats.verified_referrals, 1);
    assert_eq!(balance(&service, &referee), 25);
}

// =============================================================================
// WEEKLY BONUS
// =============================================================================

#[test]
fn test_weekly_bonus_after_seven_days() {
    let (service, clock) = make_test_service();
    let user = addr(1);

    for day in 1..=7u64 {
        service.record_faucet_claim(&user, None).unwrap();
        service
            .record_stake_event(&stake_event(&user, day, StakeEventType::Staked))
            .unwrap();
        if day == 6 {
            let early = service.claim_weekly_bonus(&user).unwrap();
            assert!(!early.awarded);
            assert_eq!(early.status, "STREAK_TOO_SHORT");
        }
        if day < 7 {
            clock.advance_to_next_day(Duration::hours(10));
        }
    }

    let bonus = service.claim_weekly_bonus(&user).unwrap();
    assert!(bonus.awarded);
    assert_eq!(bonus.points, 1000);

    let status = service.get_mission_status(&user).unwrap();
    assert!(!status.weekly_bonus.awarded);
    assert_eq!(status.weekly_bonus.status, "ALREADY_AWARDED");
    assert_eq!(status.faucet_streak, 7);
    assert_eq!(status.stake_streak, 7);
    assert!(status.has_pending_notification);

    assert!(service.acknowledge_notification(&user).unwrap());
    assert!(!service.acknowledge_notification(&user).unwrap());

    assert_eq!(balance(&service, &user), 7 * 25 + 7 * 25 + 1000);
    assert_reconciles(&service, &user);
}

#[test]
fn test_weekly_bonus_needs_activity_today() {
    let (service, clock) = make_test_service();
    let user = addr(1);
    for day in 1..=7u64 {
        service.record_faucet_claim(&user, None).unwrap();
        service
            .record_stake_event(&stake_event(&user, day, StakeEventType::Staked))
            .unwrap();
        if day < 7 {
            clock.advance_to_next_day(Duration::hours(10));
        }
    }
    clock.advance_to_next_day(Duration::hours(10));

    // streaks are 7 as of yesterday but nothing happened today
    let outcome = service.claim_weekly_bonus(&user).unwrap();
    assert!(!outcome.awarded);
    assert_eq!(outcome.status, "STALE");
}

// =============================================================================
// MISSIONS
// =============================================================================

fn draft(title: &str, reward_points: u64) -> MissionDraft {
    MissionDraft {
        kind: MissionKind::Partner,
        title: title.to_string(),
        description: "Follow the partner account".to_string(),
        reward_points,
        verification: "twitter_follow".to_string(),
    }
}

#[test]
fn test_mission_completes_once() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let mission = service.create_mission(draft("Follow", 200)).unwrap();
    assert_eq!(mission.id, 1);

    let id = mission.id.to_string();
    let first = service.complete_mission(&user, &id).unwrap();
    assert!(first.credited);
    assert_eq!(first.points_awarded, 200);

    let replay = service.complete_mission(&user, &id).unwrap();
    assert!(!replay.credited);
    assert_eq!(replay.new_balance, 200);

    let status = service.get_mission_status(&user).unwrap();
    assert_eq!(status.missions.len(), 1);
    assert!(status.missions[0].completed);
}

#[test]
fn test_mission_errors() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let mission = service.create_mission(draft("Follow", 200)).unwrap();

    assert!(matches!(
        service.complete_mission(&user, "  "),
        Err(LedgerError::MissingTaskId)
    ));
    assert_eq!(
        service.complete_mission(&user, "abc").unwrap_err().code(),
        "MISSION_NOT_FOUND"
    );
    assert_eq!(
        service.complete_mission(&user, "99").unwrap_err().code(),
        "MISSION_NOT_FOUND"
    );

    service.set_mission_active(mission.id, false).unwrap();
    assert_eq!(
        service
            .complete_mission(&user, &mission.id.to_string())
            .unwrap_err()
            .code(),
        "MISSION_INACTIVE"
    );
    assert!(service.list_missions(false).unwrap().is_empty());
    assert_eq!(service.list_missions(true).unwrap().len(), 1);
    assert_eq!(balance(&service, &user), 0);
}

#[test]
fn test_update_mission() {
    let (service, _clock) = make_test_service();
    let mission = service.create_mission(draft("Follow", 200)).unwrap();
    let updated = service
        .update_mission(
            mission.id,
            MissionUpdate {
                reward_points: Some(300),
                ..MissionUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.reward_points, 300);
    assert_eq!(updated.title, "Follow");

    assert!(service.create_mission(draft(" ", 10)).is_err());
    assert!(service.update_mission(42, MissionUpdate::default()).is_err());
}

// =============================================================================
// SOCIAL
// =============================================================================

#[test]
fn test_social_link_bonus_and_conflict() {
    let (service, _clock) = make_test_service();
    let user = addr(1);

    let first = service
        .link_social_identity(&user, SocialPlatform::Twitter, "tw-1", "@one")
        .unwrap();
    assert!(first.is_new_connection);
    assert_eq!(first.bonus_awarded, 100);

    let relink = service
        .link_social_identity(&user, SocialPlatform::Twitter, "tw-1", "@one")
        .unwrap();
    assert!(relink.success);
    assert!(!relink.is_new_connection);

    let err = service
        .link_social_identity(&addr(2), SocialPlatform::Twitter, "tw-1", "@one")
        .unwrap_err();
    assert_eq!(err.code(), "IDENTITY_ALREADY_LINKED");

    // switching accounts on the same platform pays nothing new
    let switched = service
        .link_social_identity(&user, SocialPlatform::Twitter, "tw-9", "@nine")
        .unwrap();
    assert!(switched.is_new_connection);
    assert_eq!(switched.bonus_awarded, 0);
    assert_eq!(balance(&service, &user), 100);

    // the released identity can be linked elsewhere
    assert!(service
        .link_social_identity(&addr(2), SocialPlatform::Twitter, "tw-1", "@one")
        .unwrap()
        .is_new_connection);
}

#[test]
fn test_twitter_link_claims_legacy_points() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    service.import_legacy_points("tw-2", 300).unwrap();

    let outcome = service
        .link_social_identity(&user, SocialPlatform::Twitter, "tw-2", "@two")
        .unwrap();
    assert_eq!(outcome.bonus_awarded, 100);
    assert_eq!(outcome.legacy_points_claimed, 300);
    assert_eq!(balance(&service, &user), 400);

    let err = service.import_legacy_points("tw-2", 10).unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert_reconciles(&service, &user);
}

#[tokio::test]
async fn test_verify_and_link_social() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let verifier = MockSocialVerifier::new()
        .with_identity(SocialPlatform::Telegram, "member", "tg-1", "@member", true)
        .with_identity(SocialPlatform::Telegram, "outsider", "tg-2", "@outsider", false)
        .with_error(
            SocialPlatform::Twitter,
            "down",
            VerifierError::Unavailable {
                message: "timeout".to_string(),
            },
        );

    let err = service
        .verify_and_link_social(&verifier, &user, SocialPlatform::Telegram, "outsider")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotGroupMember));

    let err = service
        .verify_and_link_social(&verifier, &user, SocialPlatform::Twitter, "down")
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let err = service
        .verify_and_link_social(&verifier, &user, SocialPlatform::Twitter, "unknown")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VERIFICATION_FAILED");
    assert_eq!(balance(&service, &user), 0);

    let outcome = service
        .verify_and_link_social(&verifier, &user, SocialPlatform::Telegram, "member")
        .await
        .unwrap();
    assert_eq!(outcome.bonus_awarded, 150);
    assert_eq!(verifier.calls(), 4);
}

// =============================================================================
// ADMIN
// =============================================================================

#[test]
fn test_correction_cannot_go_negative() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    service.record_faucet_claim(&user, None).unwrap();

    let err = service.apply_correction(&user, -30, "refund").unwrap_err();
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert_eq!(balance(&service, &user), 25);

    assert!(service.apply_correction(&user, -5, " ").is_err());

    let outcome = service.apply_correction(&user, -5, "refund").unwrap();
    assert_eq!(outcome.new_balance, 20);
    let log = service.get_audit_log(&user).unwrap();
    assert_eq!(log.last().unwrap().note.as_deref(), Some("refund"));
    assert_reconciles(&service, &user);
}

#[test]
fn test_reconcile_all() {
    let (service, _clock) = make_test_service();
    service.record_faucet_claim(&addr(1), None).unwrap();
    service
        .record_stake_event(&stake_event(&addr(2), 1, StakeEventType::Staked))
        .unwrap();
    service.apply_correction(&addr(3), 40, "migration").unwrap();

    let summary = service.reconcile_all().unwrap();
    assert_eq!(summary.accounts_checked, 3);
    assert!(summary.mismatches.is_empty());

    let unknown = service.reconcile(&addr(9)).unwrap();
    assert!(unknown.is_consistent());
    assert_eq!(unknown.audit_entries, 0);
}

#[test]
fn test_reconcile_is_consistent_under_live_writes() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let done = std::sync::atomic::AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            for n in 0..200 {
                service
                    .record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(n))
                    .unwrap();
            }
            done.store(true, std::sync::atomic::Ordering::SeqCst);
        });
        s.spawn(|| {
            while !done.load(std::sync::atomic::Ordering::SeqCst) {
                let report = service.reconcile(&user).unwrap();
                assert!(report.is_consistent(), "{report:?}");
                std::thread::yield_now();
            }
        });
    });

    assert_eq!(balance(&service, &user), 200 * 15);
    assert_reconciles(&service, &user);
}

#[test]
fn test_balance_overflow_is_an_invariant_violation() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    service.apply_correction(&user, i64::MAX, "seed").unwrap();
    service.apply_correction(&user, i64::MAX, "seed").unwrap();

    let err = service.apply_correction(&user, i64::MAX, "seed").unwrap_err();
    assert!(matches!(err, LedgerError::InvariantViolation { .. }));
    assert_eq!(err.code(), "INVARIANT_VIOLATION");
    assert!(!err.is_retryable());
    assert_eq!(balance(&service, &user), 2 * i64::MAX.unsigned_abs());
}

#[test]
fn test_occupied_audit_slot_blocks_the_credit() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let mut txn = service.store().begin().unwrap();
    txn.put(&keys::audit(&user, 0), b"stray").unwrap();
    txn.commit().unwrap();

    let err = service.record_faucet_claim(&user, None).unwrap_err();
    assert_eq!(err.code(), "INVARIANT_VIOLATION");
    assert!(service.get_account(&user).unwrap().is_none());
}

// =============================================================================
// READS
// =============================================================================

#[test]
fn test_leaderboard_and_profile_rank() {
    let (service, _clock) = make_test_service();
    service.apply_correction(&addr(1), 100, "seed").unwrap();
    service.apply_correction(&addr(2), 100, "seed").unwrap();
    service.apply_correction(&addr(3), 50, "seed").unwrap();

    let board = service.get_leaderboard(10).unwrap();
    assert_eq!(board.len(), 3);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[1].rank, 1);
    assert_eq!(board[2].rank, 2);
    assert_eq!(board[2].address, addr(3));

    assert_eq!(service.get_profile(&addr(1)).unwrap().rank, 1);
    assert_eq!(service.get_profile(&addr(2)).unwrap().rank, 1);
    assert_eq!(service.get_profile(&addr(3)).unwrap().rank, 3);

    let unknown = service.get_profile(&addr(9)).unwrap();
    assert_eq!(unknown.rank, 0);
    assert_eq!(unknown.points, 0);

    assert_eq!(service.get_leaderboard(0).unwrap().len(), 1);
}

#[test]
fn test_claims_break_point_ties() {
    let (service, _clock) = make_test_service();
    service.apply_correction(&addr(1), 25, "seed").unwrap();
    service.record_faucet_claim(&addr(2), None).unwrap();

    let board = service.get_leaderboard(10).unwrap();
    assert_eq!(board[0].address, addr(2));
    assert_eq!(board[1].rank, 2);
}

#[test]
fn test_global_stats() {
    let (service, _clock) = make_test_service();
    service.record_faucet_claim(&addr(1), None).unwrap();
    service.record_faucet_claim(&addr(2), None).unwrap();
    service.apply_correction(&addr(2), 10, "seed").unwrap();

    let stats = service.get_global_stats().unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_points, 60);
    assert_eq!(stats.total_activity, 3);
}

#[test]
fn test_cached_profile_invalidated_by_credit() {
    let (service, _clock) = make_test_service();
    let service = service.with_cache(Arc::new(LruReadCache::new(16)));
    let user = addr(1);

    assert_eq!(service.get_profile(&user).unwrap().points, 0);
    service.record_faucet_claim(&user, None).unwrap();
    assert_eq!(service.get_profile(&user).unwrap().points, 25);
}

// =============================================================================
// EVENTS
// =============================================================================

#[test]
fn test_events_published_after_commit_only() {
    let (service, _clock) = make_test_service();
    let bus = Arc::new(InMemoryEventBus::new());
    let mut sub = bus.subscribe(EventFilter::all());
    let service = service.with_publisher(bus.clone());
    let user = addr(1);

    service.store().fail_next_commits(1);
    assert!(service.record_faucet_claim(&user, None).is_err());
    assert!(sub.drain().is_empty());

    service.record_faucet_claim(&user, None).unwrap();
    let events = sub.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, LedgerEvent::PointsCredited { points: 25, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, LedgerEvent::StreakAdvanced { current: 1, .. })));
}

/// Collects formatted log lines for the duration of `f`.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&logs.0.lock()).into_owned();
    (value, text)
}

#[test]
fn test_failed_credit_is_logged_with_context() {
    let (service, _clock) = make_test_service();
    let user = addr(1);
    let task = TaskKind::OnChain {
        action: OnChainAction::GovernanceVote,
        tx: tx(1),
    };

    service.store().fail_next_commits(1);
    let (result, logs) = capture_logs(|| {
        service.record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(1))
    });
    assert_eq!(result.unwrap_err().code(), "STORAGE_FAILURE");

    let line = logs
        .lines()
        .find(|l| l.contains("Credit failed"))
        .unwrap_or_else(|| panic!("no failure line in:\n{logs}"));
    assert!(line.contains("ERROR"), "{line}");
    assert!(line.contains(&format!("address={user}")), "{line}");
    assert!(line.contains(&format!("task={task}")), "{line}");
    assert!(line.contains("attempted=15"), "{line}");
    assert!(line.contains("STORAGE_FAILURE"), "{line}");
}

#[test]
fn test_failed_stake_and_faucet_are_logged_with_context() {
    let (service, _clock) = make_test_service();
    let user = addr(1);

    service.store().fail_next_commits(2);
    let (results, logs) = capture_logs(|| {
        (
            service.record_stake_event(&stake_event(&user, 1, StakeEventType::Staked)),
            service.record_faucet_claim(&user, None),
        )
    });
    assert!(results.0.is_err());
    assert!(results.1.is_err());

    let failures: Vec<_> = logs.lines().filter(|l| l.contains("Credit failed")).collect();
    assert_eq!(failures.len(), 2, "{logs}");
    assert!(failures[0].contains("task=STAKED"), "{}", failures[0]);
    assert!(failures[0].contains("attempted=25"), "{}", failures[0]);
    assert!(failures[1].contains("task=FAUCET_CLAIM"), "{}", failures[1]);
    assert!(failures[1].contains("attempted=25"), "{}", failures[1]);
}

#[test]
fn test_rejected_mission_is_a_warning() {
    let (service, _clock) = make_test_service();
    let user = addr(1);

    let (result, logs) = capture_logs(|| service.complete_mission(&user, "999"));
    assert_eq!(result.unwrap_err().code(), "MISSION_NOT_FOUND");

    let line = logs
        .lines()
        .find(|l| l.contains("Credit rejected"))
        .unwrap_or_else(|| panic!("no rejection line in:\n{logs}"));
    assert!(line.contains("WARN"), "{line}");
    assert!(line.contains("task=MISSION:999"), "{line}");
    assert!(!logs.contains("Credit failed"));
}
