use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rally_league::{
    scheduling::{AvailabilityScheduler, AvailabilitySlot, find_near_misses, find_overlaps},
    tournament::{
        Confirmation, Match, MatchResult, MatchStatus, Pairing, SetScore, calculate_standings,
        generate_rounds, ranked_standings,
    },
};
use std::hint::black_box;
use uuid::Uuid;

const HORIZON_DAYS: u32 = 14;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_time(t(9, 0))
}

/// Helper to build a week of evening windows for one participant
fn evening_slots(participant_id: Uuid, start: NaiveTime, end: NaiveTime) -> Vec<AvailabilitySlot> {
    (0..7)
        .map(|day| AvailabilitySlot::new(participant_id, day, start, end))
        .collect()
}

fn roster(n: usize) -> Vec<Uuid> {
    (0..n).map(|i| Uuid::from_u128(i as u128 + 1)).collect()
}

/// Benchmark overlap search when both participants are free every evening
fn bench_find_overlaps(c: &mut Criterion) {
    let a = evening_slots(Uuid::new_v4(), t(18, 0), t(21, 0));
    let b = evening_slots(Uuid::new_v4(), t(19, 0), t(22, 0));

    c.bench_function("find_overlaps_daily_evenings", |bench| {
        bench.iter(|| find_overlaps(black_box(&a), black_box(&b), now(), HORIZON_DAYS));
    });
}

/// Benchmark near-miss search with a ten-minute gap every day
fn bench_find_near_misses(c: &mut Criterion) {
    let a = evening_slots(Uuid::new_v4(), t(18, 0), t(19, 0));
    let b = evening_slots(Uuid::new_v4(), t(19, 10), t(20, 30));

    c.bench_function("find_near_misses_daily_gap", |bench| {
        bench.iter(|| find_near_misses(black_box(&a), black_box(&b), now(), HORIZON_DAYS));
    });
}

/// Benchmark the full three-tier evaluation when nothing lines up
fn bench_evaluate_manual(c: &mut Criterion) {
    let scheduler = AvailabilityScheduler::default();
    let a = evening_slots(Uuid::new_v4(), t(6, 0), t(7, 0));
    let b = evening_slots(Uuid::new_v4(), t(20, 0), t(21, 0));

    c.bench_function("evaluate_no_overlap", |bench| {
        bench.iter(|| scheduler.evaluate(black_box(&a), black_box(&b), now()));
    });
}

/// Benchmark round-robin generation for different roster sizes
fn bench_generate_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_rounds");

    for n in [4, 8, 16, 32] {
        let ids = roster(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ids, |bench, ids| {
            bench.iter(|| generate_rounds(black_box(ids)));
        });
    }

    group.finish();
}

/// Benchmark standings for a fully played 16-player round robin
fn bench_standings(c: &mut Criterion) {
    let ids = roster(16);
    let matches: Vec<Match> = generate_rounds(&ids)
        .iter()
        .flat_map(|round| round.pairings.clone())
        .filter_map(|pairing| match pairing {
            Pairing::Match { home, away, .. } => {
                let mut m = Match::round_robin(Uuid::nil(), home, away);
                m.status = MatchStatus::Completed;
                m.result = Some(MatchResult {
                    winner_id: home.min(away),
                    sets: vec![SetScore::new(6, 4)],
                    confirmed_by: Confirmation::Opponent,
                    confirmed_at: Utc::now(),
                });
                Some(m)
            }
            Pairing::Bye { .. } => None,
        })
        .collect();

    c.bench_function("calculate_standings_16", |bench| {
        bench.iter(|| calculate_standings(black_box(&ids), black_box(&matches)));
    });

    c.bench_function("ranked_standings_16", |bench| {
        bench.iter(|| ranked_standings(black_box(&ids), black_box(&matches)));
    });
}

criterion_group!(
    scheduling,
    bench_find_overlaps,
    bench_find_near_misses,
    bench_evaluate_manual,
);

criterion_group!(tournaments, bench_generate_rounds, bench_standings);

criterion_main!(scheduling, tournaments);
