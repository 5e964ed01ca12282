use std::sync::Arc;

use crate::cache::{CacheKeys, CacheStore};
use crate::config::Config;
use crate::observability::Metrics;
use crate::store::JobRepository;

pub const SERVICE_NAME: &str = "queuewatch";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jobs: Arc<dyn JobRepository>,
    pub cache: Arc<dyn CacheStore>,
    pub cache_keys: Arc<CacheKeys>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, jobs: Arc<dyn JobRepository>, cache: Arc<dyn CacheStore>) -> Self {
        let cache_keys = CacheKeys::new(config.cache.key_prefix.clone());
        Self {
            config: Arc::new(config),
            jobs,
            cache,
            cache_keys: Arc::new(cache_keys),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
