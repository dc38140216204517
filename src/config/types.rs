//! Configuration types.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use clap::ValueEnum;

use crate::config::constants::{
    ENV_DATABASE_PASSWORD, ENV_DATABASE_PREFIX, ENV_DATABASE_URL, ENV_DATABASE_USER,
    ENV_MYSQLDUMP_BIN,
};
use crate::db::ConnectOptions;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Database connection configuration.
///
/// Can be constructed programmatically or read from the environment with
/// [`DatabaseConfig::from_env`]. Empty values are treated as "not provided".
///
/// # Examples
///
/// ```
/// use sitekit::config::DatabaseConfig;
///
/// let config = DatabaseConfig {
///     dsn: Some("sqlite::memory:".to_string()),
///     prefix: Some("app_".to_string()),
///     ..Default::default()
/// };
/// assert_eq!(config.prefix.as_deref(), Some("app_"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Data source name (URL or `driver:key=value;...` form)
    pub dsn: Option<String>,
    /// Login user
    pub username: Option<String>,
    /// Login password
    pub password: Option<String>,
    /// Table prefix
    pub prefix: Option<String>,
    /// Override for the `mysqldump` executable
    pub mysqldump_bin: Option<String>,
}

impl DatabaseConfig {
    /// Reads configuration from `DATABASE_URL`, `DATABASE_USER`,
    /// `DATABASE_PASSWORD`, `DATABASE_PREFIX` and `MYSQLDUMP_BIN`.
    pub fn from_env() -> Self {
        Self {
            dsn: non_empty_env(ENV_DATABASE_URL),
            username: non_empty_env(ENV_DATABASE_USER),
            password: non_empty_env(ENV_DATABASE_PASSWORD),
            prefix: non_empty_env(ENV_DATABASE_PREFIX),
            mysqldump_bin: non_empty_env(ENV_MYSQLDUMP_BIN),
        }
    }

    /// Converts the configuration into arguments for `Database::get_instance`.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            dsn: self.dsn.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            driver_options: Default::default(),
            prefix: self.prefix.clone(),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
