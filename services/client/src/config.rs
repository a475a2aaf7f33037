//! services/client/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;

use reading_library_core::StorageKeys;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the library API gateway.
    pub api_base_url: String,
    /// Path of the on-device JSON store.
    pub storage_path: PathBuf,
    pub log_level: Level,
    /// Names of the on-device storage slots.
    pub keys: StorageKeys,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        if api_base_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let storage_path = std::env::var("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./library_client.json"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // The key layout is fixed by what existing device stores already
        // hold; only the progress prefix is overridable.
        let mut keys = StorageKeys::default();
        if let Ok(prefix) = std::env::var("PROGRESS_KEY_PREFIX") {
            if prefix.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "PROGRESS_KEY_PREFIX".to_string(),
                    "must not be empty".to_string(),
                ));
            }
            keys.progress_prefix = prefix;
        }

        Ok(Self {
            api_base_url,
            storage_path,
            log_level,
            keys,
        })
    }
}
