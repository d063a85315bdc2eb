//! Structured logging configuration.
//!
//! Library code logs through the `log` facade; the subscriber installed here
//! captures those records alongside native `tracing` events.

use rally_league::TickReport;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use rally_server::logging;
///
/// logging::init();
/// tracing::info!("Server starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a lifecycle pass with structured fields
///
/// Passes with failures are logged as warnings; idle passes at debug.
pub fn log_tick_report(context: &str, report: &TickReport) {
    if report.failures > 0 {
        tracing::warn!(
            context = context,
            admitted = report.admitted,
            activated = report.activated,
            promoted_to_finals = report.promoted_to_finals,
            completed = report.completed,
            auto_confirmed = report.auto_confirmed,
            failures = report.failures,
            "Lifecycle pass finished with failures"
        );
    } else if report.is_idle() {
        tracing::debug!(context = context, "Lifecycle pass idle");
    } else {
        tracing::info!(
            context = context,
            admitted = report.admitted,
            activated = report.activated,
            promoted_to_finals = report.promoted_to_finals,
            completed = report.completed,
            auto_confirmed = report.auto_confirmed,
            "Lifecycle pass finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_tick_report() {
        // Just ensure it doesn't panic
        log_tick_report("test", &TickReport::default());
        log_tick_report(
            "test",
            &TickReport {
                activated: 1,
                failures: 2,
                ..TickReport::default()
            },
        );
    }
}
