//! Per-domain rollup of crawl jobs.
//!
//! Jobs whose payload has no url, or whose url yields an empty host, are
//! left out entirely. There is no "unknown" bucket.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{JobRepository, JobStatus, JobUrlRow, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAggregate {
    pub domain: String,
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub failed_jobs: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_finished_at: Option<DateTime<Utc>>,
}

impl DomainAggregate {
    fn new(domain: String) -> Self {
        Self {
            domain,
            total_jobs: 0,
            completed_jobs: 0,
            failed_jobs: 0,
            last_finished_at: None,
        }
    }
}

/// Normalize a job url to its host.
///
/// Strips an `http://` or `https://` scheme, then a `www.` label (both
/// case-insensitive), keeps everything up to the first `/` and lowercases
/// it. Returns `None` when nothing is left.
pub fn extract_domain(url: &str) -> Option<String> {
    let rest = strip_prefix_ignore_case(url, "https://")
        .or_else(|| strip_prefix_ignore_case(url, "http://"))
        .unwrap_or(url);
    let rest = strip_prefix_ignore_case(rest, "www.").unwrap_or(rest);

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

/// Accumulates [`DomainAggregate`]s one job at a time.
#[derive(Debug, Default)]
pub struct DomainRollup {
    groups: HashMap<String, DomainAggregate>,
    skipped: u64,
}

impl DomainRollup {
    pub fn observe(&mut self, row: &JobUrlRow) {
        let Some(domain) = row.url.as_deref().and_then(extract_domain) else {
            self.skipped += 1;
            return;
        };

        let entry = self
            .groups
            .entry(domain)
            .or_insert_with_key(|domain| DomainAggregate::new(domain.clone()));

        entry.total_jobs += 1;
        if row.status == JobStatus::Completed.as_str() {
            entry.completed_jobs += 1;
        } else if row.status == JobStatus::Failed.as_str() {
            entry.failed_jobs += 1;
        }
        entry.last_finished_at = entry.last_finished_at.max(row.finished_at);
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Top `limit` groups by completed jobs, then total jobs, then name.
    pub fn into_ranked(self, limit: usize) -> Vec<DomainAggregate> {
        let mut domains: Vec<DomainAggregate> = self.groups.into_values().collect();
        domains.sort_by(|a, b| {
            b.completed_jobs
                .cmp(&a.completed_jobs)
                .then_with(|| b.total_jobs.cmp(&a.total_jobs))
                .then_with(|| a.domain.cmp(&b.domain))
        });
        domains.truncate(limit);
        domains
    }
}

/// Scan every job url once and return the top `limit` domains.
pub async fn aggregate_domains(
    repo: &dyn JobRepository,
    limit: usize,
) -> Result<Vec<DomainAggregate>, StoreError> {
    let mut rows = repo.job_urls();
    let mut rollup = DomainRollup::default();
    let mut scanned = 0u64;

    while let Some(row) = rows.try_next().await? {
        rollup.observe(&row);
        scanned += 1;
    }

    debug!(scanned, skipped = rollup.skipped(), "Domain rollup complete");
    Ok(rollup.into_ranked(limit))
}
