//! Availability and scheduling data models.
//!
//! All times are local and timezone-naive. A slot is a recurring weekly
//! window; candidates and near misses pin a slot pair to a concrete date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::tournament::models::ParticipantId;

/// Shortest window that fits a match
pub const MIN_MATCH_MINUTES: i64 = 75;

/// Largest gap between two windows still reported as a near miss
pub const MAX_GAP_MINUTES: i64 = 60;

/// Largest mutual adjustment still worth suggesting
pub const MAX_FLEX_MINUTES: i64 = 90;

/// Default number of calendar days searched from "now"
pub const DEFAULT_HORIZON_DAYS: u32 = 14;

pub(crate) const MINUTES_PER_DAY: i64 = 24 * 60;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Day of week with Sunday as 0
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn day_name(day_of_week: u8) -> &'static str {
    DAY_NAMES
        .get(usize::from(day_of_week))
        .copied()
        .unwrap_or("Unknown day")
}

pub(crate) fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) / 60
}

/// Time at `minutes` past midnight, clamped to the day
pub(crate) fn time_at(minutes: i64) -> NaiveTime {
    let minutes = minutes.clamp(0, MINUTES_PER_DAY - 1);
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0).unwrap_or_default()
}

/// Start and end time within one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub(crate) fn from_minutes(start: i64, end: i64) -> Self {
        Self::new(time_at(start), time_at(end))
    }

    pub fn minutes(&self) -> i64 {
        minutes_of_day(self.end) - minutes_of_day(self.start)
    }

    pub(crate) fn start_minutes(&self) -> i64 {
        minutes_of_day(self.start)
    }

    pub(crate) fn end_minutes(&self) -> i64 {
        minutes_of_day(self.end)
    }

    /// `HH:MM-HH:MM`
    pub fn display(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Recurring weekly availability declared by a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub participant_id: ParticipantId,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl AvailabilitySlot {
    pub fn new(
        participant_id: ParticipantId,
        day_of_week: u8,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            participant_id,
            day_of_week,
            start,
            end,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }

    /// Human-readable summary, e.g. `Tuesday 18:00-20:00`
    pub fn summary(&self) -> String {
        format!("{} {}", day_name(self.day_of_week), self.window().display())
    }
}

/// Concrete date and window where both participants are free
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotCandidate {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SlotCandidate {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }

    /// Display label, e.g. `Tue 20 Oct, 18:00-19:30`
    pub fn label(&self) -> String {
        format!("{}, {}", self.date.format("%a %-d %b"), self.window().display())
    }
}

/// Level of automation reached when scheduling a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulingTier {
    /// Tier 1: overlapping availability, scheduled automatically
    Overlap,
    /// Tier 2: almost-overlapping availability, needs a small adjustment
    NearMiss,
    /// Tier 3: participants propose and pick times themselves
    Manual,
}

impl SchedulingTier {
    pub fn number(&self) -> u8 {
        match self {
            SchedulingTier::Overlap => 1,
            SchedulingTier::NearMiss => 2,
            SchedulingTier::Manual => 3,
        }
    }
}

/// Shape of a near miss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NearMissKind {
    ShortOverlap,
    BackToBack,
    Gap,
}

/// Two windows on the same day that almost allow a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearMiss {
    pub day_of_week: u8,
    pub date: NaiveDate,
    pub window_a: TimeWindow,
    pub window_b: TimeWindow,
    pub overlap_minutes: u32,
    pub gap_minutes: u32,
    /// Minutes of combined adjustment needed to reach a full match window
    pub flex_needed: u32,
    pub kind: NearMissKind,
    pub suggestion: String,
    pub flexed_window: TimeWindow,
}

impl NearMiss {
    pub fn flexed_start(&self) -> NaiveDateTime {
        self.date.and_time(self.flexed_window.start)
    }
}
