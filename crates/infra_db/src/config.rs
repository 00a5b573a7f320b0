//! Application configuration

use serde::Deserialize;

/// Application configuration, loaded from `BILLING_*` environment variables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database URL
    pub database_url: String,
    /// Maximum database connections
    pub max_connections: u32,
    /// Log filter directive
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/roadbilling".to_string(),
            max_connections: 10,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment
    ///
    /// Unset variables fall back to the defaults, so a bare environment
    /// yields a config pointing at a local database.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("BILLING"))
            .build()?
            .try_deserialize()
    }
}
