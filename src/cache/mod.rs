//! Access to the crawl cache's key-value store.
//!
//! The cache is optional telemetry: callers are expected to turn every
//! [`CacheError`] into a degraded response rather than a failed request.

mod redis_cache;

use async_trait::async_trait;
use thiserror::Error;

pub use redis_cache::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache connection closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// One page of a cursor-based key scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Zero once the key space is exhausted.
    pub cursor: u64,
    pub keys: Vec<String>,
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Integer counter at `key`; `None` when the key does not exist.
    async fn get_counter(&self, key: &str) -> Result<Option<i64>>;

    /// Non-blocking scan step starting at `cursor`.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<ScanPage>;
}

/// Key layout of the crawl cache under a common prefix.
///
/// Cached pages live at `<prefix><anything>`; hit/miss/store counters live
/// in the `<prefix>stats:` namespace and are not cache entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn hits(&self) -> String {
        format!("{}hits", self.stats_namespace())
    }

    pub fn misses(&self) -> String {
        format!("{}misses", self.stats_namespace())
    }

    pub fn stores(&self) -> String {
        format!("{}stores", self.stats_namespace())
    }

    pub fn scan_pattern(&self) -> String {
        format!("{}*", self.prefix)
    }

    pub fn stats_namespace(&self) -> String {
        format!("{}stats:", self.prefix)
    }

    pub fn is_stats_key(&self, key: &str) -> bool {
        key.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with("stats:"))
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new("global:crawl_cache:")
    }
}
