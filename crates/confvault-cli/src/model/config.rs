//! Configuration management for the confvault command line
//!
//! Settings come from `conf/application.yml` (or the file passed with
//! `--config`), overlaid by `CONFVAULT_*` environment variables, with
//! `--db-url` / `DATABASE_URL` overriding `db.url`.
//! Nested keys use a double underscore in the environment:
//! `CONFVAULT_LOCK__STALE_AFTER_SECS=600` sets `lock.stale_after_secs`.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";

pub const DB_URL: &str = "db.url";
pub const DB_POOL_MAX_CONNECTIONS: &str = "db.pool.max_connections";
pub const DB_POOL_MIN_CONNECTIONS: &str = "db.pool.min_connections";
pub const DB_POOL_CONNECT_TIMEOUT_SECS: &str = "db.pool.connect_timeout_secs";
pub const DB_POOL_SQLX_LOGGING: &str = "db.pool.sqlx_logging";
pub const LOCK_STALE_AFTER_SECS: &str = "lock.stale_after_secs";
pub const LOGGING_LEVEL: &str = "logging.level";
pub const LOGGING_DIR: &str = "logging.dir";
pub const LOGGING_FILE: &str = "logging.file";
pub const LOGGING_ROTATION: &str = "logging.rotation";

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load settings.
    ///
    /// An explicit `config_file` must exist; the default file is optional so
    /// the tool also runs from environment variables alone.
    pub fn load(config_file: Option<&Path>, database_url: Option<String>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut config_builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("CONFVAULT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(v) = database_url {
            config_builder = config_builder.set_override(DB_URL, v)?;
        }

        Ok(Configuration {
            config: config_builder.build()?,
        })
    }

    /// Integer setting as `u32`; missing, negative or oversized values use `default`
    fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default)
    }

    fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(default)
    }

    // ========================================================================
    // Database Configuration
    // ========================================================================

    pub fn database_url(&self) -> Result<String, ConfigError> {
        self.config.get_string(DB_URL)
    }

    pub fn connect_options(&self) -> Result<ConnectOptions, ConfigError> {
        let max_connections = self.get_u32(DB_POOL_MAX_CONNECTIONS, 10);
        let min_connections = self.get_u32(DB_POOL_MIN_CONNECTIONS, 1);
        let connect_timeout = self.get_u64(DB_POOL_CONNECT_TIMEOUT_SECS, 30);
        let sqlx_logging = self.config.get_bool(DB_POOL_SQLX_LOGGING).unwrap_or(false);

        let mut opt = ConnectOptions::new(self.database_url()?);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .sqlx_logging(sqlx_logging);

        tracing::debug!(
            max_connections,
            min_connections,
            connect_timeout,
            sqlx_logging,
            "Database connection pool configured"
        );

        Ok(opt)
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        let opt = self.connect_options()?;
        Ok(Database::connect(opt).await?)
    }

    // ========================================================================
    // Lock Configuration
    // ========================================================================

    /// Age after which a held lock may be reclaimed; `None` when disabled
    pub fn lock_stale_after(&self) -> Option<Duration> {
        let secs = self.get_u64(LOCK_STALE_AFTER_SECS, 0);
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGGING_DIR).ok(),
            self.config.get_bool(LOGGING_FILE).unwrap_or(false),
            self.config
                .get_string(LOGGING_LEVEL)
                .unwrap_or("info".to_string()),
            self.config
                .get_string(LOGGING_ROTATION)
                .unwrap_or("daily".to_string()),
        )
    }
}
