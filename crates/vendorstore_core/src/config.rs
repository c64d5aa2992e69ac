//! Store configuration.
//!
//! # Responsibility
//! - Hold the tunables shared by the store and its callers: database path,
//!   per-operation deadline, logging level and directory.
//! - Load overrides from `VENDORSTORE_*` environment variables.
//!
//! # Invariants
//! - `op_timeout` is never zero; a zero deadline would fail every operation.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Deadline applied to each store operation when nothing else is configured.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(3);

const DEFAULT_DB_FILE_NAME: &str = "vendorstore.sqlite3";

pub const ENV_DB_PATH: &str = "VENDORSTORE_DB_PATH";
pub const ENV_OP_TIMEOUT_MS: &str = "VENDORSTORE_OP_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "VENDORSTORE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "VENDORSTORE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTimeout(String),
    EmptyValue(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeout(value) => write!(
                f,
                "{ENV_OP_TIMEOUT_MS} must be a positive integer of milliseconds, got `{value}`"
            ),
            Self::EmptyValue(key) => write!(f, "{key} must not be empty"),
        }
    }
}

impl Error for ConfigError {}

/// Runtime configuration for opening and operating the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    /// Upper bound for a single store operation, lock waits included.
    pub op_timeout: Duration,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            op_timeout: DEFAULT_OP_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Builds a config from defaults overridden by process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults overridden by `lookup(key)` values.
    ///
    /// Split out from [`StoreConfig::from_env`] so callers and tests can
    /// supply values without touching process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            let path = path.trim();
            if path.is_empty() {
                return Err(ConfigError::EmptyValue(ENV_DB_PATH));
            }
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_OP_TIMEOUT_MS) {
            config.op_timeout = parse_timeout_ms(&raw)?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            let level = level.trim();
            if level.is_empty() {
                return Err(ConfigError::EmptyValue(ENV_LOG_LEVEL));
            }
            config.log_level = level.to_string();
        }

        if let Some(dir) = lookup(ENV_LOG_DIR) {
            let dir = dir.trim();
            config.log_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }

        Ok(config)
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
