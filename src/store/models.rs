//! Rows read from the queue tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle states of a queued job. `Backlog` is never stored in the job
/// table; it labels rows counted from the backlog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Active,
    Completed,
    Failed,
    Backlog,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Backlog => "backlog",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a job listing, with selected payload fields lifted out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobView {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub priority: i32,
    pub url: Option<String>,
    pub mode: Option<String>,
    pub team_id: Option<String>,
    pub crawl_id: Option<String>,
    pub origin: Option<String>,
    pub failed_reason: Option<String>,
    pub owner_id: Option<String>,
    pub group_id: Option<String>,
}

/// A complete job, payload included.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub priority: i32,
    pub data: Option<Value>,
    pub failed_reason: Option<String>,
    pub owner_id: Option<String>,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// The three fields the domain rollup needs from each job.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobUrlRow {
    pub url: Option<String>,
    pub status: String,
    pub finished_at: Option<DateTime<Utc>>,
}
