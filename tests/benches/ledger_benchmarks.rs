//! # Ledger Benchmarks
//!
//! | Path | What it measures |
//! |------|------------------|
//! | credit | one on-chain credit: lock, dedup check, audit row, commit |
//! | duplicate | the dedup fast path for an already-credited tx |
//! | contended | threads crediting the same account |
//! | reconcile | account scan plus one audit-prefix scan per account |

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::OnChainAction;
use zc_tests::fixtures::{addr, tx, Harness};

fn bench_credit(c: &mut Criterion) {
    let mut group = c.benchmark_group("zc-05-credit");
    group.measurement_time(Duration::from_secs(5));

    let h = Harness::new();
    let user = addr(1);
    let next = AtomicU64::new(0);
    group.bench_function("credit_single", |b| {
        b.iter(|| {
            let n = next.fetch_add(1, Ordering::Relaxed);
            black_box(
                h.ledger
                    .record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(n))
                    .unwrap(),
            )
        })
    });

    h.ledger
        .record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(u64::MAX))
        .unwrap();
    group.bench_function("credit_duplicate", |b| {
        b.iter(|| {
            black_box(
                h.ledger
                    .record_on_chain_action(&user, OnChainAction::GovernanceVote, tx(u64::MAX))
                    .unwrap(),
            )
        })
    });
    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("zc-05-contended");
    group.measurement_time(Duration::from_secs(5));

    for threads in [2u64, 4, 8] {
        let per_thread = 50u64;
        group.throughput(Throughput::Elements(threads * per_thread));
        group.bench_with_input(BenchmarkId::new("same_account", threads), &threads, |b, &t| {
            b.iter(|| {
                let h = Harness::new();
                let user = addr(1);
                thread::scope(|s| {
                    for i in 0..t {
                        let ledger = &h.ledger;
                        let user = &user;
                        s.spawn(move || {
                            for j in 0..per_thread {
                                ledger
                                    .record_on_chain_action(
                                        user,
                                        OnChainAction::GovernanceVote,
                                        tx(i * 1_000 + j),
                                    )
                                    .unwrap();
                            }
                        });
                    }
                });
            })
        });
    }
    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("zc-05-admin");

    for accounts in [100u64, 1_000] {
        let h = Harness::new();
        for n in 0..accounts {
            h.ledger
                .record_on_chain_action(&addr(n + 1), OnChainAction::GovernanceVote, tx(n))
                .unwrap();
        }
        group.bench_with_input(BenchmarkId::new("reconcile_all", accounts), &accounts, |b, _| {
            b.iter(|| black_box(h.ledger.reconcile_all().unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_credit, bench_contended, bench_reconcile);
criterion_main!(benches);
