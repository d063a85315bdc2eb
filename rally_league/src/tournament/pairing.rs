//! Round-robin pairing generation using the circle method.

use super::models::{Pairing, ParticipantId, Round};

/// Position in the frozen roster, or the virtual bye seat added for odd rosters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    Index(usize),
    Bye,
}

/// Positional round-robin schedule for `n` participants
///
/// Seat 0 stays fixed while the others rotate one place per round. An even
/// roster yields `n - 1` rounds of `n / 2` pairings; an odd roster gets a bye
/// seat and yields `n` rounds, each with exactly one bye. Fewer than two
/// participants yields no rounds.
pub fn round_robin_indices(n: usize) -> Vec<Vec<(Seat, Seat)>> {
    if n < 2 {
        return Vec::new();
    }

    let mut seats: Vec<Seat> = (0..n).map(Seat::Index).collect();
    if n % 2 == 1 {
        seats.push(Seat::Bye);
    }
    let size = seats.len();

    let mut rounds = Vec::with_capacity(size - 1);
    for round in 0..size - 1 {
        let mut pairings = Vec::with_capacity(size / 2);
        for i in 0..size / 2 {
            let (home, away) = (seats[i], seats[size - 1 - i]);
            // Alternate the fixed seat's side so nobody is always home
            if i == 0 && round % 2 == 1 {
                pairings.push((away, home));
            } else {
                pairings.push((home, away));
            }
        }
        rounds.push(pairings);
        seats[1..].rotate_right(1);
    }
    rounds
}

/// Bind the positional schedule to participant ids
///
/// Match ids are left empty; they are filled in when matches are created.
pub fn generate_rounds(participant_ids: &[ParticipantId]) -> Vec<Round> {
    round_robin_indices(participant_ids.len())
        .into_iter()
        .enumerate()
        .map(|(number, seats)| Round {
            number: number as u32 + 1,
            pairings: seats
                .into_iter()
                .filter_map(|pair| match pair {
                    (Seat::Index(home), Seat::Index(away)) => Some(Pairing::Match {
                        home: participant_ids[home],
                        away: participant_ids[away],
                        match_id: None,
                    }),
                    (Seat::Index(participant), Seat::Bye)
                    | (Seat::Bye, Seat::Index(participant)) => Some(Pairing::Bye {
                        participant: participant_ids[participant],
                    }),
                    (Seat::Bye, Seat::Bye) => None,
                })
                .collect(),
        })
        .collect()
}
