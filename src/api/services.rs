use axum::{
    Json,
    extract::{Path, RawQuery, State, rejection::PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error};

use super::{
    error::ApiError,
    models::{
        ApiIndex, ApiResponse, DomainMetadata, DomainReport, HealthResponse, JobList, Pagination,
        StatsReport,
    },
    state::{AppState, SERVICE_NAME},
    utils::{now_rfc3339, parse_job_id},
};
use crate::observability::Metrics;
use crate::query::{DomainParams, FilterSpec, JobQueryBuilder, ListParams, resolve_domain_limit};
use crate::stats::{
    CACHED_URLS_UNKNOWN, CacheStats, CacheStatsCollector, aggregate_domains, aggregate_status,
};
use crate::store::JobRecord;

/// Counts the outcome of a handler before it is turned into a response.
fn track<T>(metrics: &Metrics, result: Result<T, ApiError>) -> Result<T, ApiError> {
    match &result {
        Ok(_) => metrics.request_served(),
        Err(_) => metrics.request_failed(),
    }
    result
}

/// Health check endpoint (GET /health)
///
/// Healthy means the queue database answers a trivial query. The cache is
/// not consulted; a degraded cache only shows up in `/status/stats`.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.jobs.ping().await {
        Ok(()) => {
            state.metrics.request_served();
            let response = HealthResponse {
                status: "healthy",
                service: Some(SERVICE_NAME),
                error: None,
                timestamp: now_rfc3339(),
            };
            (StatusCode::OK, Json(response))
        }
        Err(err) => {
            error!(error = %err, "Health check failed");
            state.metrics.request_failed();
            let response = HealthResponse {
                status: "unhealthy",
                service: None,
                error: Some(err.to_string()),
                timestamp: now_rfc3339(),
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(response))
        }
    }
}

/// Job listing endpoint (GET /status)
///
/// Query parameters are never rejected; see [`FilterSpec::resolve`] for how
/// out-of-range values are coerced. A repeated key keeps its first value.
pub async fn list_jobs(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let spec = FilterSpec::resolve(&ListParams::from_query(query.as_deref()));
        let (count_query, list_query) = JobQueryBuilder::new(&spec).build();

        let (total, jobs) = tokio::try_join!(
            state.jobs.count_jobs(&count_query),
            state.jobs.list_jobs(&list_query),
        )?;

        debug!(total, returned = jobs.len(), "Listed jobs");

        let pagination = Pagination {
            total,
            limit: spec.limit,
            offset: spec.offset,
            returned: jobs.len(),
        };
        Ok::<_, ApiError>(Json(ApiResponse::ok(JobList { jobs, pagination })))
    }
    .await;

    track(&state.metrics, result)
}

/// Aggregate statistics endpoint (GET /status/stats)
///
/// A database failure fails the request. A cache failure does not; it is
/// reported inside `cache_stats`.
pub async fn job_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let collector = CacheStatsCollector::new(
        state.cache.as_ref(),
        &state.cache_keys,
        state.config.cache.scan_count,
    );

    let (queue, cache_stats) =
        tokio::join!(aggregate_status(state.jobs.as_ref()), collector.collect());

    match &cache_stats {
        CacheStats::Disabled { .. } => state.metrics.cache_degraded(),
        CacheStats::Enabled(snapshot) if snapshot.cached_urls == CACHED_URLS_UNKNOWN => {
            state.metrics.cache_scan_failed()
        }
        CacheStats::Enabled(_) => {}
    }

    let result = queue.map_err(ApiError::from).map(|queue| {
        Json(ApiResponse::ok(StatsReport {
            queue_stats: queue.queue_stats,
            total_jobs: queue.total_jobs,
            cache_stats,
        }))
    });

    track(&state.metrics, result)
}

/// Per-domain rollup endpoint (GET /status/domains)
pub async fn domain_stats(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let limit = resolve_domain_limit(&DomainParams::from_query(query.as_deref()));

    let result = aggregate_domains(state.jobs.as_ref(), limit as usize)
        .await
        .map_err(ApiError::from)
        .map(|domains| {
            let metadata = DomainMetadata {
                limit,
                returned: domains.len(),
            };
            Json(ApiResponse::ok(DomainReport { domains, metadata }))
        });

    track(&state.metrics, result)
}

/// Single job endpoint (GET /status/{id})
///
/// Returns the stored job with its complete payload. A path segment that
/// cannot be decoded names no job and gets the same 404.
pub async fn get_job(
    State(state): State<AppState>,
    job_id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let Path(job_id) = job_id.map_err(|_| ApiError::JobNotFound)?;
        let id = parse_job_id(&job_id)?;
        let job: JobRecord = state
            .jobs
            .find_job(id)
            .await?
            .ok_or(ApiError::JobNotFound)?;
        Ok::<_, ApiError>(Json(ApiResponse::ok(job)))
    }
    .await;

    track(&state.metrics, result)
}

/// API description endpoint (GET /)
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.request_served();
    Json(ApiResponse::ok(ApiIndex::describe(SERVICE_NAME)))
}
