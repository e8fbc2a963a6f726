//! Service configuration
//!
//! Layered lowest to highest: built-in defaults, `$CONFIG_PATH/default.*`
//! (optional, `CONFIG_PATH` defaults to `config`), `APP__SECTION__KEY`
//! environment variables, and `DATABASE_URL` for the connection string.

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{env, path::Path, time::Duration};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
    /// Deadline given to each request's storage calls
    pub request_timeout_secs: u64,
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());

        let mut builder = Config::builder()
            .add_source(File::from(Path::new(&config_path).join("default")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }
}
