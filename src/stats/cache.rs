use serde::Serialize;
use serde::ser::Serializer;
use tracing::{debug, warn};

use crate::cache::{CacheKeys, CacheStore, Result};

/// Reported in place of a key count when the scan could not finish.
pub const CACHED_URLS_UNKNOWN: i64 = -1;

/// Cache effectiveness, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheStats {
    Enabled(CacheSnapshot),
    Disabled { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub hits: i64,
    pub misses: i64,
    pub stores: i64,
    /// Approximate entry count, or [`CACHED_URLS_UNKNOWN`].
    pub cached_urls: i64,
    pub total_requests: i64,
    pub hit_rate_percent: f64,
}

impl CacheSnapshot {
    pub fn new(counters: CacheCounters, cached_urls: i64) -> Self {
        Self {
            hits: counters.hits,
            misses: counters.misses,
            stores: counters.stores,
            cached_urls,
            total_requests: counters.hits.saturating_add(counters.misses),
            hit_rate_percent: hit_rate_percent(counters.hits, counters.misses),
        }
    }
}

impl CacheStats {
    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheStats::Enabled(_))
    }
}

impl Serialize for CacheStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Enabled<'a> {
            enabled: bool,
            #[serde(flatten)]
            snapshot: &'a CacheSnapshot,
        }

        #[derive(Serialize)]
        struct Disabled<'a> {
            enabled: bool,
            error: &'a str,
        }

        match self {
            CacheStats::Enabled(snapshot) => Enabled {
                enabled: true,
                snapshot,
            }
            .serialize(serializer),
            CacheStats::Disabled { error } => Disabled {
                enabled: false,
                error,
            }
            .serialize(serializer),
        }
    }
}

/// Raw counter values; absent keys read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub hits: i64,
    pub misses: i64,
    pub stores: i64,
}

/// `hits / (hits + misses) * 100` to two decimals; zero with no requests.
pub fn hit_rate_percent(hits: i64, misses: i64) -> f64 {
    let total = hits.saturating_add(misses);
    if total <= 0 {
        return 0.0;
    }
    let rate = hits as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Reads counters and counts cache entries. Never fails.
pub struct CacheStatsCollector<'a> {
    store: &'a dyn CacheStore,
    keys: &'a CacheKeys,
    scan_count: usize,
}

impl<'a> CacheStatsCollector<'a> {
    pub fn new(store: &'a dyn CacheStore, keys: &'a CacheKeys, scan_count: usize) -> Self {
        Self {
            store,
            keys,
            scan_count,
        }
    }

    pub async fn collect(&self) -> CacheStats {
        let counters = match self.read_counters().await {
            Ok(counters) => counters,
            Err(err) => {
                warn!(error = %err, "Error fetching cache stats");
                return CacheStats::Disabled {
                    error: err.to_string(),
                };
            }
        };

        let cached_urls = match self.count_cached_urls().await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "Cache key scan failed");
                CACHED_URLS_UNKNOWN
            }
        };

        CacheStats::Enabled(CacheSnapshot::new(counters, cached_urls))
    }

    async fn read_counters(&self) -> Result<CacheCounters> {
        let hits = self.store.get_counter(&self.keys.hits()).await?;
        let misses = self.store.get_counter(&self.keys.misses()).await?;
        let stores = self.store.get_counter(&self.keys.stores()).await?;

        Ok(CacheCounters {
            hits: hits.unwrap_or(0),
            misses: misses.unwrap_or(0),
            stores: stores.unwrap_or(0),
        })
    }

    /// Walk the key space until the cursor returns to zero. Any failing page
    /// discards the partial count.
    async fn count_cached_urls(&self) -> Result<i64> {
        let pattern = self.keys.scan_pattern();
        let mut cursor = 0;
        let mut count = 0i64;
        let mut pages = 0u64;

        loop {
            let page = self.store.scan(cursor, &pattern, self.scan_count).await?;
            count += page
                .keys
                .iter()
                .filter(|key| !self.keys.is_stats_key(key))
                .count() as i64;
            pages += 1;

            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(count, pages, "Cache key scan complete");
        Ok(count)
    }
}
