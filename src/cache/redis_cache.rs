use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::{CacheError, CacheStore, Result, ScanPage};

/// Process-wide Redis handle.
///
/// The connection is opened on first use and then shared. Concurrent first
/// callers wait on a single initialization; a failed attempt leaves the cell
/// empty so a later request can try again.
pub struct RedisCache {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    closed: AtomicBool,
}

impl RedisCache {
    /// Validate the URL. Does not connect.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Refuse further use. In-flight commands finish on their own clone.
    pub async fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(was_connected = self.connection.initialized(), "Redis handle closed");
        }
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }

        let manager = self
            .connection
            .get_or_try_init(|| async {
                // Requests fail fast instead of waiting out reconnect backoff.
                let config = ConnectionManagerConfig::new().set_number_of_retries(0);
                let mut manager =
                    ConnectionManager::new_with_config(self.client.clone(), config).await?;
                redis::cmd("PING").query_async::<()>(&mut manager).await?;
                info!("Redis connection established");
                Ok::<_, CacheError>(manager)
            })
            .await
            .inspect_err(|err| error!(error = %err, "Redis connection error"))?;

        Ok(manager.clone())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_counter(&self, key: &str) -> Result<Option<i64>> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<ScanPage> {
        let mut conn = self.connection().await?;
        let (cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        Ok(ScanPage { cursor, keys })
    }
}
