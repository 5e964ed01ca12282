use std::sync::LazyLock;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::query::{JobQuery, QueryParam};

use super::JobRepository;
use super::error::{Result, StoreError};
use super::models::{JobRecord, JobUrlRow, JobView, StatusCount};
use super::schema::{BACKLOG_TABLE, JOB_TABLE};

static STATUS_COUNTS_SQL: LazyLock<String> = LazyLock::new(|| {
    format!("SELECT status::text AS status, COUNT(*) AS count FROM {JOB_TABLE} GROUP BY status")
});

static BACKLOG_COUNT_SQL: LazyLock<String> =
    LazyLock::new(|| format!("SELECT COUNT(*) AS count FROM {BACKLOG_TABLE}"));

static JOB_URLS_SQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "SELECT data->>'url' AS url, status::text AS status, finished_at \
         FROM {JOB_TABLE} WHERE data->>'url' IS NOT NULL"
    )
});

static FIND_JOB_SQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "SELECT id, status::text AS status, created_at, finished_at, priority, data, \
         failedreason AS failed_reason, owner_id::text AS owner_id, group_id::text AS group_id \
         FROM {JOB_TABLE} WHERE id = $1"
    )
});

/// Postgres-backed job repository over a lazily connecting pool.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    /// Build the pool. No connection is made until the first query, so the
    /// service starts (and reports unhealthy) while the database is down.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&config.url)?;

        info!(
            max_connections = config.max_connections,
            "Postgres pool configured"
        );
        Ok(Self { pool })
    }

    /// Close every pooled connection. Called once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Postgres pool closed");
    }
}

#[async_trait]
impl JobRepository for PgJobStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn count_jobs(&self, query: &JobQuery) -> Result<i64> {
        let mut statement = sqlx::query_scalar::<_, i64>(&query.sql);
        for param in &query.params {
            statement = match param {
                QueryParam::Text(value) => statement.bind(value.as_str()),
                QueryParam::Int(value) => statement.bind(*value),
            };
        }

        let total = statement.fetch_one(&self.pool).await?;
        debug!(total, "Counted jobs");
        Ok(total)
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobView>> {
        let mut statement = sqlx::query_as::<_, JobView>(&query.sql);
        for param in &query.params {
            statement = match param {
                QueryParam::Text(value) => statement.bind(value.as_str()),
                QueryParam::Int(value) => statement.bind(*value),
            };
        }

        let jobs = statement.fetch_all(&self.pool).await?;
        debug!(returned = jobs.len(), "Listed jobs");
        Ok(jobs)
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCount>(STATUS_COUNTS_SQL.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_backlog(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(BACKLOG_COUNT_SQL.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn job_urls(&self) -> BoxStream<'_, Result<JobUrlRow>> {
        sqlx::query_as::<_, JobUrlRow>(JOB_URLS_SQL.as_str())
            .fetch(&self.pool)
            .map_err(StoreError::from)
            .boxed()
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRecord>> {
        let job = sqlx::query_as::<_, JobRecord>(FIND_JOB_SQL.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }
}
