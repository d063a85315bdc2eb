/// Property-based tests for standings
///
/// Standings are a pure function of the roster and the completed matches, so
/// shuffling the match list must never change the output.
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rally_league::tournament::{
    Confirmation, Match, MatchResult, MatchStatus, SetScore, calculate_standings,
    ranked_standings,
};
use uuid::Uuid;

const ROSTER: usize = 6;

fn roster() -> Vec<Uuid> {
    (0..ROSTER).map(|i| Uuid::from_u128(i as u128 + 100)).collect()
}

// (a index, b index, a wins, set scores, minutes offset)
fn match_strategy() -> impl Strategy<Value = (usize, usize, bool, Vec<(u8, u8)>, i64)> {
    (
        0..ROSTER,
        0..ROSTER,
        any::<bool>(),
        prop::collection::vec((0u8..=7, 0u8..=7), 1..=3),
        0i64..10_000,
    )
        .prop_filter("distinct participants", |(a, b, _, _, _)| a != b)
}

fn build(
    ids: &[Uuid],
    specs: &[(usize, usize, bool, Vec<(u8, u8)>, i64)],
) -> Vec<Match> {
    let base = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
    specs
        .iter()
        .enumerate()
        .map(|(i, (a, b, a_wins, sets, offset))| {
            let (pa, pb) = (ids[*a], ids[*b]);
            let mut m = Match::adhoc(pa, pb);
            m.id = Uuid::from_u128(i as u128 + 1);
            m.status = MatchStatus::Completed;
            m.result = Some(MatchResult {
                winner_id: if *a_wins { pa } else { pb },
                sets: sets.iter().map(|&(x, y)| SetScore::new(x, y)).collect(),
                confirmed_by: Confirmation::Opponent,
                confirmed_at: base + Duration::minutes(*offset),
            });
            m
        })
        .collect()
}

proptest! {
    #[test]
    fn order_independent(
        specs in prop::collection::vec(match_strategy(), 0..20),
        seed in any::<u64>(),
    ) {
        let ids = roster();
        let matches = build(&ids, &specs);

        let mut shuffled = matches.clone();
        shuffled.reverse();
        if !shuffled.is_empty() {
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
        }

        prop_assert_eq!(
            calculate_standings(&ids, &matches),
            calculate_standings(&ids, &shuffled)
        );
        prop_assert_eq!(ranked_standings(&ids, &matches), ranked_standings(&ids, &shuffled));
    }

    #[test]
    fn tallies_balance(specs in prop::collection::vec(match_strategy(), 0..20)) {
        let ids = roster();
        let matches = build(&ids, &specs);
        let standings = calculate_standings(&ids, &matches);

        let played: u32 = standings.iter().map(|e| e.played).sum();
        let won: u32 = standings.iter().map(|e| e.won).sum();
        let lost: u32 = standings.iter().map(|e| e.lost).sum();
        let set_diff: i32 = standings.iter().map(|e| e.set_diff).sum();
        let game_diff: i32 = standings.iter().map(|e| e.game_diff).sum();

        prop_assert_eq!(played as usize, matches.len() * 2);
        prop_assert_eq!(won as usize, matches.len());
        prop_assert_eq!(lost as usize, matches.len());
        prop_assert_eq!(set_diff, 0);
        prop_assert_eq!(game_diff, 0);
    }

    #[test]
    fn ranking_is_sorted(specs in prop::collection::vec(match_strategy(), 0..20)) {
        let ids = roster();
        let ranked = ranked_standings(&ids, &build(&ids, &specs));

        prop_assert_eq!(ranked.len(), ROSTER);
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let key_a = (a.won, a.set_diff, a.game_diff);
            let key_b = (b.won, b.set_diff, b.game_diff);
            prop_assert!(key_a >= key_b);
        }
    }
}
