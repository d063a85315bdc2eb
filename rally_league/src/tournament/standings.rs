//! Standings recomputed from completed matches.

use super::models::{HeadToHead, Match, MatchResult, ParticipantId, StandingEntry};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One standing entry per listed participant, in roster order
///
/// Only completed matches carrying a result count. Matches are folded in
/// `(confirmed_at, id)` order, so a rematch overrides the earlier head-to-head
/// outcome no matter how the input slice is ordered.
pub fn calculate_standings(
    participant_ids: &[ParticipantId],
    matches: &[Match],
) -> Vec<StandingEntry> {
    let mut entries: HashMap<ParticipantId, StandingEntry> = participant_ids
        .iter()
        .map(|&id| {
            let mut entry = StandingEntry::new(id);
            entry.head_to_head = participant_ids
                .iter()
                .filter(|&&other| other != id)
                .map(|&other| (other, HeadToHead::Pending))
                .collect();
            (id, entry)
        })
        .collect();

    let mut completed: Vec<(&Match, &MatchResult)> = matches
        .iter()
        .filter(|m| m.is_completed())
        .filter_map(|m| m.result.as_ref().map(|r| (m, r)))
        .filter(|(m, r)| m.involves(r.winner_id))
        .collect();
    completed.sort_by_key(|(m, r)| (r.confirmed_at, m.id));

    for (m, result) in completed {
        let (a_sets, b_sets, a_games, b_games) = result.sets.iter().fold(
            (0u32, 0u32, 0u32, 0u32),
            |(a_sets, b_sets, a_games, b_games), set| {
                let (a_won, b_won) = match set.a_games.cmp(&set.b_games) {
                    Ordering::Greater => (1, 0),
                    Ordering::Less => (0, 1),
                    Ordering::Equal => (0, 0),
                };
                (
                    a_sets + a_won,
                    b_sets + b_won,
                    a_games + u32::from(set.a_games),
                    b_games + u32::from(set.b_games),
                )
            },
        );

        let sides = [
            (m.participant_a, m.participant_b, a_sets, b_sets, a_games, b_games),
            (m.participant_b, m.participant_a, b_sets, a_sets, b_games, a_games),
        ];
        for (me, opponent, sets_won, sets_lost, games_won, games_lost) in sides {
            let Some(entry) = entries.get_mut(&me) else {
                continue;
            };
            let won = result.winner_id == me;
            entry.played += 1;
            if won {
                entry.won += 1;
            } else {
                entry.lost += 1;
            }
            entry.sets_won += sets_won;
            entry.sets_lost += sets_lost;
            entry.games_won += games_won;
            entry.games_lost += games_lost;
            entry.set_diff = entry.sets_won as i32 - entry.sets_lost as i32;
            entry.game_diff = entry.games_won as i32 - entry.games_lost as i32;
            entry.head_to_head.insert(
                opponent,
                if won { HeadToHead::Win } else { HeadToHead::Loss },
            );
        }
    }

    participant_ids
        .iter()
        .filter_map(|id| entries.remove(id))
        .collect()
}

/// Canonical ranking: wins, then set difference, then game difference, all
/// descending, with participant id as the final tie-break
pub fn compare_entries(a: &StandingEntry, b: &StandingEntry) -> Ordering {
    b.won
        .cmp(&a.won)
        .then_with(|| b.set_diff.cmp(&a.set_diff))
        .then_with(|| b.game_diff.cmp(&a.game_diff))
        .then_with(|| a.participant_id.cmp(&b.participant_id))
}

/// Sort standings into canonical ranking order
pub fn rank_standings(mut standings: Vec<StandingEntry>) -> Vec<StandingEntry> {
    standings.sort_by(compare_entries);
    standings
}

/// Ranked standings for a roster and its matches
pub fn ranked_standings(
    participant_ids: &[ParticipantId],
    matches: &[Match],
) -> Vec<StandingEntry> {
    rank_standings(calculate_standings(participant_ids, matches))
}
