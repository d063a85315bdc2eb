//! Tier 1: shared windows long enough for a match.

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};

use super::models::{
    AvailabilitySlot, MIN_MATCH_MINUTES, SlotCandidate, TimeWindow, day_of_week, minutes_of_day,
};

/// Dates from `now`'s date onward, one per calendar day of the horizon
pub(crate) fn horizon_dates(
    now: NaiveDateTime,
    horizon_days: u32,
) -> impl Iterator<Item = NaiveDate> {
    let today = now.date();
    (0..u64::from(horizon_days))
        .filter_map(move |offset| today.checked_add_days(Days::new(offset)))
}

/// Common part of two windows, if they intersect
pub(crate) fn intersect(a: TimeWindow, b: TimeWindow) -> (i64, i64) {
    (
        a.start_minutes().max(b.start_minutes()),
        a.end_minutes().min(b.end_minutes()),
    )
}

/// First whole minute of `date` that is not in the past
fn earliest_start(date: NaiveDate, now: NaiveDateTime) -> i64 {
    if date != now.date() {
        return 0;
    }
    let time = now.time();
    let partial_minute = time.second() > 0 || time.nanosecond() > 0;
    minutes_of_day(time) + i64::from(partial_minute)
}

/// Every shared window of at least [`MIN_MATCH_MINUTES`] within the horizon
///
/// Candidates are sorted chronologically and deduplicated. On `now`'s date a
/// window that has already started is clipped to start now, and dropped if
/// less than [`MIN_MATCH_MINUTES`] of it remains.
pub fn find_overlaps(
    slots_a: &[AvailabilitySlot],
    slots_b: &[AvailabilitySlot],
    now: NaiveDateTime,
    horizon_days: u32,
) -> Vec<SlotCandidate> {
    let mut candidates = Vec::new();

    for date in horizon_dates(now, horizon_days) {
        let dow = day_of_week(date);
        let earliest = earliest_start(date, now);
        for a in slots_a.iter().filter(|s| s.day_of_week == dow) {
            for b in slots_b.iter().filter(|s| s.day_of_week == dow) {
                let (start, end) = intersect(a.window(), b.window());
                let start = start.max(earliest);
                if end - start < MIN_MATCH_MINUTES {
                    continue;
                }
                let window = TimeWindow::from_minutes(start, end);
                candidates.push(SlotCandidate {
                    date,
                    start: window.start,
                    end: window.end,
                });
            }
        }
    }

    candidates.sort();
    candidates.dedup();
    candidates
}
