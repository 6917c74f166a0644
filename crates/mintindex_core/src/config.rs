//! Indexer core settings.
//!
//! Settings are plain JSON; every field has a default so an empty object is
//! a valid configuration.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::logging::{default_log_level, init_logging, normalize_level, normalize_log_dir};
use crate::service::resolver::ResolverConfig;
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidLogLevel(String),
    InvalidLogDir(String),
    InvalidDbPath(String),
    Logging(String),
    Db(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidLogDir(message) => write!(f, "{message}"),
            Self::InvalidDbPath(message) => write!(f, "invalid db_path: {message}"),
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Core settings for one indexer process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
    /// SQLite database file; `None` means in-memory.
    pub db_path: Option<PathBuf>,
    /// Default retention for unlinked join records.
    pub retain_on_unlink: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
            retain_on_unlink: ResolverConfig::default().retain_on_unlink,
        }
    }
}

impl CoreConfig {
    /// Parses and validates JSON settings.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        if let Some(log_dir) = &self.log_dir {
            normalize_log_dir(log_dir).map_err(ConfigError::InvalidLogDir)?;
        }
        if let Some(db_path) = &self.db_path {
            if db_path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidDbPath("path cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Starts file logging when `log_dir` is set.
    ///
    /// Returns whether a logger is now running with these settings.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(&self.log_level, log_dir).map_err(ConfigError::Logging)?;
        Ok(true)
    }

    /// Opens the configured registry database, in memory when `db_path` is unset.
    pub fn open_db(&self) -> Result<Connection, ConfigError> {
        let conn = match &self.db_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Ok(conn)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            retain_on_unlink: self.retain_on_unlink,
        }
    }
}
