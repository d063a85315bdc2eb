/// Property-based tests for round-robin pairing generation
///
/// These tests verify that the circle method covers every pair exactly once
/// for any roster size.
use proptest::prelude::*;
use rally_league::tournament::{Pairing, Seat, generate_rounds, round_robin_indices};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

fn roster(n: usize) -> Vec<Uuid> {
    (0..n).map(|i| Uuid::from_u128(i as u128 + 1)).collect()
}

proptest! {
    #[test]
    fn every_pair_meets_exactly_once(n in 2usize..=24) {
        let mut seen = HashSet::new();
        for round in round_robin_indices(n) {
            for pair in round {
                if let (Seat::Index(a), Seat::Index(b)) = pair {
                    prop_assert_ne!(a, b);
                    let key = (a.min(b), a.max(b));
                    prop_assert!(seen.insert(key), "pair {:?} repeated", key);
                }
            }
        }
        prop_assert_eq!(seen.len(), n * (n - 1) / 2);
    }

    #[test]
    fn round_count_matches_parity(n in 2usize..=24) {
        let rounds = round_robin_indices(n);
        let expected = if n % 2 == 0 { n - 1 } else { n };
        prop_assert_eq!(rounds.len(), expected);
    }

    #[test]
    fn odd_rosters_have_one_bye_per_round(half in 1usize..=12) {
        let n = half * 2 + 1;
        for round in generate_rounds(&roster(n)) {
            let byes = round
                .pairings
                .iter()
                .filter(|p| matches!(p, Pairing::Bye { .. }))
                .count();
            prop_assert_eq!(byes, 1);
        }
    }

    #[test]
    fn everyone_appears_once_per_round(n in 2usize..=24) {
        let ids = roster(n);
        for round in generate_rounds(&ids) {
            let mut present = BTreeSet::new();
            for pairing in &round.pairings {
                match pairing {
                    Pairing::Match { home, away, .. } => {
                        prop_assert!(present.insert(*home));
                        prop_assert!(present.insert(*away));
                    }
                    Pairing::Bye { participant } => {
                        prop_assert!(present.insert(*participant));
                    }
                }
            }
            prop_assert_eq!(present.len(), n);
        }
    }
}

#[test]
fn tiny_rosters_have_no_rounds() {
    assert!(round_robin_indices(0).is_empty());
    assert!(round_robin_indices(1).is_empty());
    assert!(generate_rounds(&roster(1)).is_empty());
}
