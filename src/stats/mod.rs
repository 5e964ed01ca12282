//! Aggregations served by the stats endpoints.

mod cache;
mod domains;
mod status;

pub use cache::{
    CACHED_URLS_UNKNOWN, CacheCounters, CacheSnapshot, CacheStats, CacheStatsCollector,
    hit_rate_percent,
};
pub use domains::{DomainAggregate, DomainRollup, aggregate_domains, extract_domain};
pub use status::{QueueStats, aggregate_status};
