use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "QUEUEWATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/queuewatch.toml";
const ENV_PREFIX: &str = "QUEUEWATCH";
const ENV_SEPARATOR: &str = "__";

/// Variables understood by earlier deployments of the status service.
const DATABASE_URL_VAR: &str = "NUQ_DATABASE_URL";
const REDIS_URL_VAR: &str = "REDIS_URL";
const PORT_VAR: &str = "PORT";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. `QUEUEWATCH__*` variables
/// 5. `NUQ_DATABASE_URL`, `REDIS_URL`, `PORT` (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    apply_legacy_env(&mut config, |name| env::var(name).ok())?;

    Ok(config)
}

/// Apply the service's historical environment variables on top of `config`.
///
/// `lookup` is injected so the mapping can be tested without touching the
/// process environment.
pub fn apply_legacy_env<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(DATABASE_URL_VAR).filter(|v| !v.is_empty()) {
        config.database.url = url;
    }
    if let Some(url) = lookup(REDIS_URL_VAR).filter(|v| !v.is_empty()) {
        config.cache.url = url;
    }
    if let Some(port) = lookup(PORT_VAR).filter(|v| !v.is_empty()) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("{PORT_VAR} is not a valid port: {port}")))?;
    }
    Ok(())
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // QUEUEWATCH__DATABASE__MAX_CONNECTIONS -> database.max_connections
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
