use super::models::Config;
use thiserror::Error;

const POSTGRES_SCHEMES: &[&str] = &["postgres://", "postgresql://"];
const REDIS_SCHEMES: &[&str] = &["redis://", "rediss://", "unix://", "redis+unix://"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.port must be non-zero")]
    InvalidPort,

    #[error("database.url must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    #[error("cache.url must start with redis://, rediss://, unix:// or redis+unix://")]
    InvalidCacheUrl,

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("cache.key_prefix must be non-empty and end with ':' (got '{0}')")]
    InvalidKeyPrefix(String),

    #[error("logging.level '{0}' is not a valid filter directive")]
    InvalidLogLevel(String),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_database(config)?;
    validate_cache(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.port == 0 {
        return Err(ValidationError::InvalidPort);
    }
    Ok(())
}

fn validate_database(config: &Config) -> Result<(), ValidationError> {
    let database = &config.database;

    if !has_scheme(&database.url, POSTGRES_SCHEMES) {
        return Err(ValidationError::InvalidDatabaseUrl);
    }
    if database.max_connections == 0 {
        return Err(ValidationError::NonPositive {
            field: "database.max_connections",
        });
    }
    if database.acquire_timeout_secs == 0 {
        return Err(ValidationError::NonPositive {
            field: "database.acquire_timeout_secs",
        });
    }
    Ok(())
}

fn validate_cache(config: &Config) -> Result<(), ValidationError> {
    let cache = &config.cache;

    if !has_scheme(&cache.url, REDIS_SCHEMES) {
        return Err(ValidationError::InvalidCacheUrl);
    }
    if cache.key_prefix.is_empty() || !cache.key_prefix.ends_with(':') {
        return Err(ValidationError::InvalidKeyPrefix(cache.key_prefix.clone()));
    }
    if cache.scan_count == 0 {
        return Err(ValidationError::NonPositive {
            field: "cache.scan_count",
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> Result<(), ValidationError> {
    let level = config.logging.level.trim();
    if level.is_empty() || tracing_subscriber::EnvFilter::try_new(level).is_err() {
        return Err(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }
    Ok(())
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    let url = url.trim();
    schemes.iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}
