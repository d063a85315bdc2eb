//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use rally_league::{db::DatabaseConfig, tournament::EngineConfig, tournament::InvalidSetting};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Lifecycle engine configuration
    pub engine: EngineConfig,
    /// Optional HTTP slot ranking endpoint for ad-hoc matches
    pub ranker_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `tick_secs_override` - Optional engine tick interval override (from CLI args)
    /// * `ranker_url_override` - Optional ranking endpoint override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if `DATABASE_URL` is missing and no override was given
    pub fn from_env(
        database_url_override: Option<String>,
        tick_secs_override: Option<u64>,
        ranker_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut database = DatabaseConfig::from_env();
        database.database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "e.g. postgres://postgres@localhost/rally_league".to_string(),
            })?;

        let mut engine = EngineConfig::from_env();
        if let Some(secs) = tick_secs_override {
            engine.tick_interval_secs = secs;
        }

        let ranker_url = ranker_url_override
            .or_else(|| std::env::var("RANKER_URL").ok())
            .filter(|url| !url.trim().is_empty());

        Ok(ServerConfig {
            database,
            engine,
            ranker_url,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if let Some(url) = &self.ranker_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    var: "RANKER_URL".to_string(),
                    reason: "Must be an http:// or https:// URL".to_string(),
                });
            }
        }

        self.engine.validate()?;
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Engine(#[from] InvalidSetting),
}
