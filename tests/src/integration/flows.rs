//! # End-to-End Ledger Flows
//!
//! A referred user's first week, driven through the public ledger API with
//! the read cache and event bus attached:
//!
//! ```text
//! faucet(code) ──→ referral pair paid ──→ daily faucet + stake ──→ weekly bonus
//!       │                  │                        │                   │
//!       └──────────────────┴──── PointsCredited ────┴── WeeklyBonusAwarded
//! ```

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_types::{ContractKind, MissionKind, OnChainAction, SocialPlatform, StakeEventType};
    use zc_05_points_ledger::MissionDraft;

    use crate::fixtures::{addr, stake_event, tx, Harness};

    #[test]
    fn test_referred_user_first_week() {
        let h = Harness::new();
        let referrer = addr(1);
        let referee = addr(2);
        let mut credits = h
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Credits]));

        let code = h.ledger.ensure_referral_code(&referrer).unwrap();
        let first = h.ledger.record_faucet_claim(&referee, Some(&code)).unwrap();
        assert!(first.allowed);
        assert!(first.referral_bonus_paid);
        assert_eq!(h.balance(&referee), 75);
        assert_eq!(h.balance(&referrer), 100);

        for day in 1..=7u64 {
            if day > 1 {
                h.clock.advance_to_next_day(Duration::hours(9));
                assert!(h.ledger.record_faucet_claim(&referee, None).unwrap().allowed);
            }
            let stake = h
                .ledger
                .record_stake_event(&stake_event(
                    &referee,
                    day,
                    ContractKind::Native,
                    StakeEventType::Staked,
                ))
                .unwrap();
            assert!(stake.credited);
            assert_eq!(stake.stake_streak, Some(u32::try_from(day).unwrap()));
        }

        let bonus = h.ledger.claim_weekly_bonus(&referee).unwrap();
        assert!(bonus.awarded);
        assert_eq!(bonus.points, 1000);
        // 75 on day one, then six more faucet claims, seven stakes, the bonus
        assert_eq!(h.balance(&referee), 75 + 6 * 25 + 7 * 25 + 1000);

        let stats = h.ledger.get_referral_stats(&referrer).unwrap().stats;
        assert_eq!(stats.total_referrals, 1);
        assert_eq!(stats.verified_referrals, 1);
        assert_eq!(stats.active_stakers, 1);

        let board = h.ledger.get_leaderboard(10).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].address, referee);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].rank, 2);
        assert_eq!(h.ledger.get_profile(&referrer).unwrap().rank, 2);

        let events = credits.drain();
        let weekly = events
            .iter()
            .filter(|e| matches!(e, LedgerEvent::WeeklyBonusAwarded { .. }))
            .count();
        assert_eq!(weekly, 1);
        assert!(events.iter().any(|e| matches!(
            e,
            LedgerEvent::PointsCredited { address, points: 100, .. } if *address == referrer
        )));

        h.assert_all_reconcile();
    }

    #[test]
    fn test_profile_cache_tracks_every_write_path() {
        let h = Harness::new();
        let user = addr(3);
        assert_eq!(h.ledger.get_profile(&user).unwrap().points, 0);

        h.ledger.record_faucet_claim(&user, None).unwrap();
        assert_eq!(h.ledger.get_profile(&user).unwrap().points, 25);

        h.ledger
            .record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(77))
            .unwrap();
        assert_eq!(h.ledger.get_profile(&user).unwrap().points, 40);

        let mission = h
            .ledger
            .create_mission(MissionDraft {
                kind: MissionKind::Daily,
                title: "Read the docs".to_string(),
                description: "Open the staking guide".to_string(),
                reward_points: 60,
                verification: "link_visit".to_string(),
            })
            .unwrap();
        h.ledger
            .complete_mission(&user, &mission.id.to_string())
            .unwrap();
        assert_eq!(h.ledger.get_profile(&user).unwrap().points, 100);

        h.ledger
            .link_social_identity(&user, SocialPlatform::Telegram, "tg-3", "three")
            .unwrap();
        assert_eq!(h.ledger.get_profile(&user).unwrap().points, 250);

        h.ledger
            .apply_correction(&user, -50, "duplicate airdrop")
            .unwrap();
        assert_eq!(h.ledger.get_profile(&user).unwrap().points, 200);

        let stats = h.ledger.get_global_stats().unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_points, 200);
        h.assert_all_reconcile();
    }

    #[test]
    fn test_legacy_points_follow_the_identity() {
        let h = Harness::new();
        let first = addr(4);
        let second = addr(5);
        h.ledger.import_legacy_points("tw-legacy", 500).unwrap();

        let outcome = h
            .ledger
            .link_social_identity(&first, SocialPlatform::Twitter, "tw-legacy", "@early")
            .unwrap();
        assert_eq!(outcome.legacy_points_claimed, 500);

        // the identity is taken until the first wallet switches away
        let err = h
            .ledger
            .link_social_identity(&second, SocialPlatform::Twitter, "tw-legacy", "@early")
            .unwrap_err();
        assert_eq!(err.code(), "IDENTITY_ALREADY_LINKED");

        h.ledger
            .link_social_identity(&first, SocialPlatform::Twitter, "tw-other", "@other")
            .unwrap();
        let relinked = h
            .ledger
            .link_social_identity(&second, SocialPlatform::Twitter, "tw-legacy", "@early")
            .unwrap();
        assert_eq!(relinked.legacy_points_claimed, 0);

        h.assert_all_reconcile();
    }
}
