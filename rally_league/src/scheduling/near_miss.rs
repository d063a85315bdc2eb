//! Tier 2: windows that almost allow a match.

use chrono::{NaiveDateTime, NaiveTime};
use std::collections::HashSet;

use super::models::{
    AvailabilitySlot, MAX_FLEX_MINUTES, MAX_GAP_MINUTES, MIN_MATCH_MINUTES, MINUTES_PER_DAY,
    NearMiss, NearMissKind, TimeWindow, day_name, day_of_week, time_at,
};
use super::overlap::{horizon_dates, intersect};

/// Overlap, gap and kind for a window pair short of a full match window
fn classify(a: TimeWindow, b: TimeWindow) -> Option<(i64, i64, NearMissKind)> {
    let (start, end) = intersect(a, b);
    let shared = end - start;

    let (overlap, gap, kind) = if shared >= MIN_MATCH_MINUTES {
        return None;
    } else if shared > 0 {
        (shared, 0, NearMissKind::ShortOverlap)
    } else if shared == 0 {
        (0, 0, NearMissKind::BackToBack)
    } else if -shared <= MAX_GAP_MINUTES {
        (0, -shared, NearMissKind::Gap)
    } else {
        return None;
    };

    let flex = MIN_MATCH_MINUTES - overlap + gap;
    (flex <= MAX_FLEX_MINUTES).then_some((overlap, gap, kind))
}

/// Match-length window centred on the overlap (or the gap between the
/// windows), shifted to stay within the union of both windows and the day
fn flexed_window(a: TimeWindow, b: TimeWindow) -> TimeWindow {
    let (start, end) = intersect(a, b);
    // For a gap, `start` and `end` swap roles; their sum is still twice the centre
    let mut flexed_start = (start + end - MIN_MATCH_MINUTES).div_euclid(2);

    let union_start = a.start_minutes().min(b.start_minutes());
    let union_end = a.end_minutes().max(b.end_minutes());
    if flexed_start + MIN_MATCH_MINUTES > union_end {
        flexed_start = union_end - MIN_MATCH_MINUTES;
    }
    if flexed_start < union_start {
        flexed_start = union_start;
    }
    // The day boundary wins over the union: a window can't run past 23:59
    flexed_start = flexed_start.min(MINUTES_PER_DAY - 1 - MIN_MATCH_MINUTES);

    TimeWindow::from_minutes(flexed_start, flexed_start + MIN_MATCH_MINUTES)
}

fn suggestion(
    kind: NearMissKind,
    day: u8,
    (overlap, gap, flex): (i64, i64, i64),
    meet_at: NaiveTime,
    window: &TimeWindow,
) -> String {
    let day = day_name(day);
    let target = window.display();
    match kind {
        NearMissKind::ShortOverlap => format!(
            "You overlap for only {overlap} minutes on {day}. Stretching your windows by \
             {flex} minutes between you would make room for a {target} match."
        ),
        NearMissKind::BackToBack => format!(
            "Your {day} windows are back-to-back at {}. Shifting by {flex} minutes between \
             you would make room for a {target} match.",
            meet_at.format("%H:%M")
        ),
        NearMissKind::Gap => format!(
            "There is a {gap}-minute gap between your {day} windows. Shifting by {flex} \
             minutes between you would make room for a {target} match."
        ),
    }
}

/// Window pairs short of a full match, least adjustment first
///
/// Each weekly slot pair is reported once, at its next occurrence within the
/// horizon whose flexed window has not already started.
pub fn find_near_misses(
    slots_a: &[AvailabilitySlot],
    slots_b: &[AvailabilitySlot],
    now: NaiveDateTime,
    horizon_days: u32,
) -> Vec<NearMiss> {
    let mut seen = HashSet::new();
    let mut near_misses = Vec::new();

    for date in horizon_dates(now, horizon_days) {
        let dow = day_of_week(date);
        for (ia, a) in slots_a.iter().enumerate().filter(|(_, s)| s.day_of_week == dow) {
            for (ib, b) in slots_b.iter().enumerate().filter(|(_, s)| s.day_of_week == dow) {
                if seen.contains(&(ia, ib)) {
                    continue;
                }
                let (window_a, window_b) = (a.window(), b.window());
                let Some((overlap, gap, kind)) = classify(window_a, window_b) else {
                    continue;
                };
                let flexed = flexed_window(window_a, window_b);
                if date.and_time(flexed.start) < now {
                    continue;
                }

                let flex = MIN_MATCH_MINUTES - overlap + gap;
                let meet_at = time_at(intersect(window_a, window_b).0);
                seen.insert((ia, ib));
                near_misses.push(NearMiss {
                    day_of_week: dow,
                    date,
                    window_a,
                    window_b,
                    overlap_minutes: overlap as u32,
                    gap_minutes: gap as u32,
                    flex_needed: flex as u32,
                    kind,
                    suggestion: suggestion(kind, dow, (overlap, gap, flex), meet_at, &flexed),
                    flexed_window: flexed,
                });
            }
        }
    }

    near_misses.sort_by_key(|nm| (nm.flex_needed, nm.flexed_start()));
    near_misses
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(day: u8, start: NaiveTime, end: NaiveTime) -> AvailabilitySlot {
        AvailabilitySlot::new(Uuid::nil(), day, start, end)
    }

    fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_ten_minute_gap_on_tuesday() {
        let a = vec![slot(2, t(18, 0), t(19, 0))];
        let b = vec![slot(2, t(19, 10), t(20, 30))];

        let misses = find_near_misses(&a, &b, monday_morning(), 14);
        assert_eq!(misses.len(), 1);

        let miss = &misses[0];
        assert_eq!(miss.overlap_minutes, 0);
        assert_eq!(miss.gap_minutes, 10);
        assert_eq!(miss.flex_needed, 85);
        assert_eq!(miss.kind, NearMissKind::Gap);
        assert_eq!(miss.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(miss.flexed_window.minutes(), 75);
        assert_eq!(miss.flexed_window.start, t(18, 27));
        assert!(miss.suggestion.contains("10-minute gap"));
    }

    #[test]
    fn test_short_overlap() {
        let a = vec![slot(4, t(18, 0), t(19, 0))];
        let b = vec![slot(4, t(18, 15), t(21, 0))];

        let misses = find_near_misses(&a, &b, monday_morning(), 14);
        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].kind, NearMissKind::ShortOverlap);
        assert_eq!(misses[0].overlap_minutes, 45);
        assert_eq!(misses[0].flex_needed, 30);
        assert_eq!(misses[0].flexed_window, TimeWindow::new(t(18, 0), t(19, 15)));
        assert!(misses[0].suggestion.contains("45 minutes"));
    }

    #[test]
    fn test_back_to_back() {
        let a = vec![slot(6, t(9, 0), t(10, 0))];
        let b = vec![slot(6, t(10, 0), t(12, 0))];

        let misses = find_near_misses(&a, &b, monday_morning(), 14);
        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].kind, NearMissKind::BackToBack);
        assert_eq!(misses[0].flex_needed, 75);
        assert!(misses[0].suggestion.contains("back-to-back at 10:00"));
    }

    #[test]
    fn test_large_gaps_and_flex_discarded() {
        // 61-minute gap is never reported
        let a = vec![slot(2, t(8, 0), t(9, 0))];
        let b = vec![slot(2, t(10, 1), t(12, 0))];
        assert!(find_near_misses(&a, &b, monday_morning(), 14).is_empty());

        // 20-minute gap needs 95 minutes of flex
        let b = vec![slot(2, t(9, 20), t(12, 0))];
        assert!(find_near_misses(&a, &b, monday_morning(), 14).is_empty());
    }

    #[test]
    fn test_full_overlap_is_not_a_near_miss() {
        let a = vec![slot(2, t(18, 0), t(20, 0))];
        let b = vec![slot(2, t(18, 0), t(20, 0))];
        assert!(find_near_misses(&a, &b, monday_morning(), 14).is_empty());
    }

    #[test]
    fn test_sorted_by_flex() {
        let a = vec![slot(2, t(18, 0), t(19, 0)), slot(3, t(18, 0), t(19, 0))];
        let b = vec![slot(2, t(19, 10), t(20, 0)), slot(3, t(18, 30), t(20, 0))];

        let misses = find_near_misses(&a, &b, monday_morning(), 14);
        assert_eq!(misses.len(), 2);
        assert_eq!(misses[0].flex_needed, 45);
        assert_eq!(misses[1].flex_needed, 85);
    }

    #[test]
    fn test_flexed_window_anchored_in_short_union() {
        let a = TimeWindow::new(t(18, 0), t(18, 30));
        let b = TimeWindow::new(t(18, 35), t(19, 5));
        let flexed = flexed_window(a, b);
        assert_eq!(flexed.start, t(18, 0));
        assert_eq!(flexed.minutes(), 75);
    }

    #[test]
    fn test_flexed_window_shifted_back_before_midnight() {
        let a = TimeWindow::new(t(23, 0), t(23, 30));
        let b = TimeWindow::new(t(23, 30), t(23, 59));
        let flexed = flexed_window(a, b);
        assert_eq!(flexed, TimeWindow::new(t(22, 44), t(23, 59)));
        assert_eq!(flexed.minutes(), 75);
    }

    #[test]
    fn test_late_night_near_miss_keeps_full_length() {
        let a = vec![slot(2, t(23, 0), t(23, 30))];
        let b = vec![slot(2, t(23, 30), t(23, 59))];

        let misses = find_near_misses(&a, &b, monday_morning(), 14);
        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].kind, NearMissKind::BackToBack);
        assert_eq!(misses[0].flexed_window.minutes(), 75);
        assert_eq!(misses[0].flexed_window.end, t(23, 59));
        assert!(misses[0].suggestion.contains("22:44-23:59"));
    }
}
