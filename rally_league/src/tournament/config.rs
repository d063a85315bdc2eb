//! Engine configuration.

use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::db::config::parse_env_or;
use crate::scheduling::models::DEFAULT_HORIZON_DAYS;

/// Longest UTC offset accepted, in minutes
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Rejected engine setting
#[derive(Debug, Error)]
#[error("Invalid engine setting {var}: {reason}")]
pub struct InvalidSetting {
    pub var: &'static str,
    pub reason: String,
}

/// Lifecycle engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Seconds between periodic ticks
    pub tick_interval_secs: u64,

    /// Days after which a tournament with the minimum roster activates
    pub registration_window_days: i64,

    /// Hours an unconfirmed result waits before auto-confirming
    pub dispute_grace_hours: i64,

    /// Calendar days searched for match times
    pub scheduling_horizon_days: u32,

    /// Time allowed for the slot ranking call, in milliseconds
    pub ranking_timeout_ms: u64,

    /// Offset of the league's local time from UTC, in minutes
    pub utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            registration_window_days: 7,
            dispute_grace_hours: 48,
            scheduling_horizon_days: DEFAULT_HORIZON_DAYS,
            ranking_timeout_ms: 5000,
            utc_offset_minutes: 0,
        }
    }
}

impl EngineConfig {
    /// Load from environment variables, using defaults for anything unset
    ///
    /// - `ENGINE_TICK_INTERVAL_SECS` (default: 30)
    /// - `REGISTRATION_WINDOW_DAYS` (default: 7)
    /// - `DISPUTE_GRACE_HOURS` (default: 48)
    /// - `SCHEDULING_HORIZON_DAYS` (default: 14)
    /// - `RANKING_TIMEOUT_MS` (default: 5000)
    /// - `LEAGUE_UTC_OFFSET_MINUTES` (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval_secs: parse_env_or(
                "ENGINE_TICK_INTERVAL_SECS",
                defaults.tick_interval_secs,
            ),
            registration_window_days: parse_env_or(
                "REGISTRATION_WINDOW_DAYS",
                defaults.registration_window_days,
            ),
            dispute_grace_hours: parse_env_or("DISPUTE_GRACE_HOURS", defaults.dispute_grace_hours),
            scheduling_horizon_days: parse_env_or(
                "SCHEDULING_HORIZON_DAYS",
                defaults.scheduling_horizon_days,
            ),
            ranking_timeout_ms: parse_env_or("RANKING_TIMEOUT_MS", defaults.ranking_timeout_ms),
            utc_offset_minutes: parse_env_or(
                "LEAGUE_UTC_OFFSET_MINUTES",
                defaults.utc_offset_minutes,
            ),
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        let positive = [
            ("ENGINE_TICK_INTERVAL_SECS", self.tick_interval_secs as i64),
            ("REGISTRATION_WINDOW_DAYS", self.registration_window_days),
            ("DISPUTE_GRACE_HOURS", self.dispute_grace_hours),
            ("SCHEDULING_HORIZON_DAYS", i64::from(self.scheduling_horizon_days)),
            ("RANKING_TIMEOUT_MS", self.ranking_timeout_ms as i64),
        ];
        if let Some((var, _)) = positive.iter().find(|(_, value)| *value <= 0) {
            return Err(InvalidSetting {
                var: *var,
                reason: "Must be greater than zero".to_string(),
            });
        }

        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(InvalidSetting {
                var: "LEAGUE_UTC_OFFSET_MINUTES",
                reason: format!("Must be within ±{MAX_UTC_OFFSET_MINUTES} minutes"),
            });
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn registration_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.registration_window_days)
    }

    pub fn dispute_grace(&self) -> chrono::Duration {
        chrono::Duration::hours(self.dispute_grace_hours)
    }

    pub fn ranking_timeout(&self) -> Duration {
        Duration::from_millis(self.ranking_timeout_ms)
    }

    /// League-local offset; out-of-range values fall back to UTC
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
