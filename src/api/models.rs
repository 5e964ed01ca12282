//! Response bodies for the status endpoints.
//!
//! Every endpoint except `/health` wraps its payload in [`ApiResponse`]:
//!
//! ```json
//! {
//!   "success": true,
//!   "data": { "...": "endpoint payload" },
//!   "timestamp": "2025-01-01T12:00:00.000000Z"
//! }
//! ```
//!
//! Failures keep the same envelope with `success: false` and an `error`
//! message instead of `data`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::stats::{CacheStats, DomainAggregate};
use crate::store::JobView;

use super::utils::now_rfc3339;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: now_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: now_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub returned: usize,
}

#[derive(Debug, Serialize)]
pub struct JobList {
    pub jobs: Vec<JobView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub queue_stats: BTreeMap<String, i64>,
    pub total_jobs: i64,
    pub cache_stats: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct DomainMetadata {
    pub limit: i64,
    pub returned: usize,
}

#[derive(Debug, Serialize)]
pub struct DomainReport {
    pub domains: Vec<DomainAggregate>,
    pub metadata: DomainMetadata,
}

/// Static description served at `/`.
#[derive(Debug, Serialize)]
pub struct ApiIndex {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, EndpointDoc>,
}

#[derive(Debug, Serialize)]
pub struct EndpointDoc {
    pub description: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<&'static str, &'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<&'static str>,
}

impl EndpointDoc {
    fn new(description: &'static str) -> Self {
        Self {
            description,
            parameters: BTreeMap::new(),
            example: None,
        }
    }

    fn param(mut self, name: &'static str, doc: &'static str) -> Self {
        self.parameters.insert(name, doc);
        self
    }

    fn example(mut self, example: &'static str) -> Self {
        self.example = Some(example);
        self
    }
}

impl ApiIndex {
    pub fn describe(service: &'static str) -> Self {
        let endpoints = BTreeMap::from([
            (
                "GET /health",
                EndpointDoc::new("Health check; 503 when the queue database is unreachable"),
            ),
            (
                "GET /status",
                EndpointDoc::new("Paginated job listing with optional status filter")
                    .param("limit", "Number of jobs to return (0-1000, default 100)")
                    .param("offset", "Number of jobs to skip (default 0)")
                    .param("status", "Filter by status: queued, active, completed, failed")
                    .param(
                        "order",
                        "Sort field: created_at, finished_at, priority, status (default created_at)",
                    )
                    .param("direction", "Sort direction: asc or desc (default desc)")
                    .example("/status?limit=50&status=completed&order=finished_at&direction=desc"),
            ),
            (
                "GET /status/stats",
                EndpointDoc::new("Job counts per status, backlog included, plus cache statistics"),
            ),
            (
                "GET /status/domains",
                EndpointDoc::new("Job counts grouped by domain, most completed first")
                    .param("limit", "Number of domains to return (1-200, default 25)")
                    .example("/status/domains?limit=50"),
            ),
            (
                "GET /status/{id}",
                EndpointDoc::new("A single job with its full payload")
                    .example("/status/123e4567-e89b-12d3-a456-426614174000"),
            ),
        ]);

        Self {
            service,
            version: env!("CARGO_PKG_VERSION"),
            endpoints,
        }
    }
}
