//! # Concurrency
//!
//! Many OS threads hitting the same rows through one ledger. The store's
//! per-key locks plus whole-transaction retry must keep every credit
//! exactly-once and every balance equal to its audit sum.

#[cfg(test)]
mod tests {
    use std::thread;

    use rand::seq::SliceRandom;
    use shared_types::{ContractKind, MissionKind, OnChainAction, StakeEventType};
    use zc_05_points_ledger::MissionDraft;

    use crate::fixtures::{addr, stake_event, tx, Harness};

    const THREADS: u64 = 8;

    #[test]
    fn test_distinct_credits_on_one_account_all_land() {
        let h = Harness::new();
        let user = addr(1);
        let per_thread = 25u64;

        thread::scope(|s| {
            for t in 0..THREADS {
                let ledger = &h.ledger;
                let user = &user;
                s.spawn(move || {
                    for i in 0..per_thread {
                        let outcome = ledger
                            .record_on_chain_action(
                                user,
                                OnChainAction::GovernanceVote,
                                tx(t * 1_000 + i),
                            )
                            .unwrap();
                        assert!(outcome.credited);
                    }
                });
            }
        });

        assert_eq!(h.balance(&user), THREADS * per_thread * 15);
        let audit = h.ledger.get_audit_log(&user).unwrap();
        assert_eq!(audit.len() as u64, THREADS * per_thread);
        h.assert_all_reconcile();
    }

    #[test]
    fn test_same_stake_from_every_thread_credits_once() {
        let h = Harness::new();
        let user = addr(2);
        let event = stake_event(&user, 9, ContractKind::Token, StakeEventType::Staked);

        let credited: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let ledger = &h.ledger;
                    let event = &event;
                    s.spawn(move || ledger.record_stake_event(event).unwrap().credited)
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| usize::from(handle.join().unwrap()))
                .sum()
        });

        assert_eq!(credited, 1);
        assert_eq!(h.balance(&user), 20);
        assert_eq!(h.ledger.get_staking_history(&user, None, None).unwrap().len(), 1);
        h.assert_all_reconcile();
    }

    #[test]
    fn test_referees_racing_on_one_referrer() {
        let h = Harness::new();
        let referrer = addr(3);
        let code = h.ledger.ensure_referral_code(&referrer).unwrap();

        thread::scope(|s| {
            for n in 0..THREADS {
                let ledger = &h.ledger;
                let code = code.as_str();
                s.spawn(move || {
                    let referee = addr(100 + n);
                    let claim = ledger.record_faucet_claim(&referee, Some(code)).unwrap();
                    assert!(claim.allowed);
                    assert!(claim.referral_bonus_paid);
                    // a late explicit distribution never pays twice
                    assert!(!ledger.distribute_referral_bonus(&referee).unwrap().paid);
                });
            }
        });

        assert_eq!(h.balance(&referrer), THREADS * 100);
        for n in 0..THREADS {
            assert_eq!(h.balance(&addr(100 + n)), 75);
        }
        let stats = h.ledger.get_referral_stats(&referrer).unwrap().stats;
        assert_eq!(stats.total_referrals, THREADS);
        assert_eq!(stats.verified_referrals, THREADS);
        h.assert_all_reconcile();
    }

    #[test]
    fn test_mixed_workload_reconciles() {
        let h = Harness::new();
        let mission = h
            .ledger
            .create_mission(MissionDraft {
                kind: MissionKind::Social,
                title: "Retweet".to_string(),
                description: "Retweet the launch post".to_string(),
                reward_points: 40,
                verification: "twitter_retweet".to_string(),
            })
            .unwrap();
        let mission_id = mission.id.to_string();
        let users: Vec<_> = (0..4).map(|n| addr(200 + n)).collect();

        #[derive(Clone, Copy)]
        enum Op {
            Faucet,
            Stake(u64),
            Mission,
            Vote(u64),
        }

        let mut ops = Vec::new();
        for (u, _) in users.iter().enumerate() {
            let base = u as u64 * 100;
            for _ in 0..3 {
                ops.push((u, Op::Faucet));
                ops.push((u, Op::Mission));
            }
            for i in 0..5 {
                ops.push((u, Op::Stake(base + i)));
                ops.push((u, Op::Vote(base + i)));
            }
        }
        ops.shuffle(&mut rand::thread_rng());

        thread::scope(|s| {
            for chunk in ops.chunks(ops.len().div_ceil(THREADS as usize)) {
                let ledger = &h.ledger;
                let users = &users;
                let mission_id = mission_id.as_str();
                s.spawn(move || {
                    for (u, op) in chunk {
                        let user = &users[*u];
                        match op {
                            Op::Faucet => {
                                ledger.record_faucet_claim(user, None).unwrap();
                            }
                            Op::Stake(n) => {
                                ledger
                                    .record_stake_event(&stake_event(
                                        user,
                                        *n,
                                        ContractKind::Native,
                                        StakeEventType::Staked,
                                    ))
                                    .unwrap();
                            }
                            Op::Mission => {
                                ledger.complete_mission(user, mission_id).unwrap();
                            }
                            Op::Vote(n) => {
                                ledger
                                    .record_on_chain_action(
                                        user,
                                        OnChainAction::GovernanceVote,
                                        tx(10_000 + n),
                                    )
                                    .unwrap();
                            }
                        }
                    }
                });
            }
        });

        // one faucet claim per day, one mission completion, every stake and vote
        for user in &users {
            assert_eq!(h.balance(user), 25 + 40 + 5 * 25 + 5 * 15);
        }
        let stats = h.ledger.get_global_stats().unwrap();
        assert_eq!(stats.total_users, users.len() as u64);
        h.assert_all_reconcile();
    }
}
