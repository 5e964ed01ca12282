use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::store::{JobRepository, JobStatus, StatusCount, StoreError};

/// Job counts keyed by status name, backlog included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub queue_stats: BTreeMap<String, i64>,
    pub total_jobs: i64,
}

impl QueueStats {
    /// Merge per-status rows with the backlog count. The backlog bucket is
    /// always present, even when empty.
    pub fn merge(rows: impl IntoIterator<Item = StatusCount>, backlog: i64) -> Self {
        let mut queue_stats = BTreeMap::new();
        for row in rows {
            *queue_stats.entry(row.status).or_insert(0) += row.count;
        }
        *queue_stats
            .entry(JobStatus::Backlog.as_str().to_string())
            .or_insert(0) += backlog;

        let total_jobs = queue_stats.values().sum();
        Self {
            queue_stats,
            total_jobs,
        }
    }
}

/// Count jobs per status across the job and backlog tables.
///
/// Both counts are required; if either query fails no partial result is
/// returned.
pub async fn aggregate_status(repo: &dyn JobRepository) -> Result<QueueStats, StoreError> {
    let (rows, backlog) = tokio::try_join!(repo.count_by_status(), repo.count_backlog())?;
    let stats = QueueStats::merge(rows, backlog);
    debug!(total_jobs = stats.total_jobs, "Aggregated queue status");
    Ok(stats)
}
