//! Rally league lifecycle service.
//!
//! Connects to PostgreSQL and runs the tournament engine's periodic tick
//! until interrupted.

mod config;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use rally_league::{
    db::{Database, PgStore, Stores},
    scheduling::{ChronologicalRanker, HttpSlotRanker, SlotRanker},
    tournament::TournamentEngine,
};
use tokio::sync::Notify;

use config::ServerConfig;

const HELP: &str = "\
Run the rally league lifecycle engine

USAGE:
  rally_server [OPTIONS]

OPTIONS:
  --db-url      URL        Database connection string  [default: env DATABASE_URL]
  --tick-secs   N          Seconds between engine ticks  [default: 30]
  --ranker-url  URL        Slot ranking endpoint for ad-hoc matches  [default: env RANKER_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  ENGINE_TICK_INTERVAL_SECS  Seconds between engine ticks
  RANKER_URL               HTTP slot ranker (chronological order when unset)
  RUST_LOG                 Log filter (default: info,sqlx=warn)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let tick_secs: Option<u64> = pargs.opt_value_from_str("--tick-secs")?;
    let ranker_url: Option<String> = pargs.opt_value_from_str("--ranker-url")?;

    logging::init();

    let config = ServerConfig::from_env(database_url, tick_secs, ranker_url)?;
    config.validate()?;

    // Catching signals for exit.
    let interrupted = Arc::new(Notify::new());
    let signal = Arc::clone(&interrupted);
    set_handler(move || signal.notify_one())?;

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.health_check().await.context("Database health check failed")?;

    let store = Arc::new(PgStore::new(db.pool().clone()));
    store
        .ensure_schema()
        .await
        .context("Failed to apply database schema")?;
    info!("Database connected successfully");

    let ranker: Arc<dyn SlotRanker> = match &config.ranker_url {
        Some(url) => {
            info!("Ranking ad-hoc slots via {}", url);
            Arc::new(HttpSlotRanker::new(url.clone()))
        }
        None => {
            info!("No ranker configured, ad-hoc slots ranked chronologically");
            Arc::new(ChronologicalRanker)
        }
    };

    let engine = Arc::new(TournamentEngine::with_ranker(
        Stores::shared(store),
        config.engine.clone(),
        ranker,
    ));

    // Catch up on anything that came due while the service was down
    let report = engine.tick().await;
    logging::log_tick_report("startup", &report);

    engine.start().await;
    info!(
        "Engine running, ticking every {}s. Press Ctrl+C to stop.",
        config.engine.tick_interval_secs
    );

    interrupted.notified().await;

    info!("Shutting down engine...");
    if let Some(handle) = engine.stop().await {
        handle.await.context("Engine loop panicked")?;
    }
    db.close().await;
    info!("Shutdown complete");

    Ok(())
}
