//! Configuration management for queuewatch
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use queuewatch::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `QUEUEWATCH__<section>__<key>`
//!
//! Examples:
//! - `QUEUEWATCH__SERVER__PORT=9000`
//! - `QUEUEWATCH__DATABASE__MAX_CONNECTIONS=20`
//! - `QUEUEWATCH__CACHE__SCAN_COUNT=500`
//!
//! The variables used by earlier deployments still work and win over
//! everything else: `NUQ_DATABASE_URL`, `REDIS_URL` and `PORT`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/queuewatch.toml`.
//! This can be overridden using the `QUEUEWATCH_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{CacheConfig, Config, DatabaseConfig, LogFormat, LoggingConfig, ServerConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed, an
    /// environment override cannot be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
