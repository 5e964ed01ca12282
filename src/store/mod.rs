//! Read-only access to the job queue tables.
//!
//! [`JobRepository`] is the seam between request handling and the
//! relational store. [`PgJobStore`] is the production implementation; tests
//! substitute in-memory fakes.

mod error;
mod models;
mod postgres;
pub mod schema;

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::query::JobQuery;

pub use error::{Result, StoreError};
pub use models::{JobRecord, JobStatus, JobUrlRow, JobView, StatusCount};
pub use postgres::PgJobStore;

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Succeeds when a connection can be obtained.
    async fn ping(&self) -> Result<()>;

    /// Execute a count query built by [`crate::query::JobQueryBuilder`].
    async fn count_jobs(&self, query: &JobQuery) -> Result<i64>;

    /// Execute a page query built by [`crate::query::JobQueryBuilder`].
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobView>>;

    /// Row count per status in the job table.
    async fn count_by_status(&self) -> Result<Vec<StatusCount>>;

    /// Row count of the backlog table.
    async fn count_backlog(&self) -> Result<i64>;

    /// Every job with a payload url, streamed in a single pass.
    fn job_urls(&self) -> BoxStream<'_, Result<JobUrlRow>>;

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRecord>>;
}
