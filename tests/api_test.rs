use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use futures::{StreamExt, stream::BoxStream};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

use queuewatch::api::{AppState, build_router};
use queuewatch::cache::{CacheError, CacheStore, ScanPage};
use queuewatch::config::Config;
use queuewatch::query::{JobQuery, QueryParam};
use queuewatch::store::{
    JobRecord, JobRepository, JobUrlRow, JobView, Result as StoreResult, StatusCount, StoreError,
};

const KNOWN_JOB: &str = "123e4567-e89b-12d3-a456-426614174000";

fn unreachable() -> StoreError {
    StoreError::Database(sqlx::Error::Io(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "connection refused",
    )))
}

/// In-memory queue tables
#[derive(Default)]
struct FakeRepo {
    down: bool,
    status_counts_fail: bool,
    backlog_fails: bool,
    jobs: Vec<JobView>,
    status_counts: Vec<StatusCount>,
    backlog: i64,
    urls: Vec<JobUrlRow>,
    records: HashMap<Uuid, JobRecord>,
    queries: Mutex<Vec<JobQuery>>,
}

impl FakeRepo {
    fn check(&self) -> StoreResult<()> {
        if self.down { Err(unreachable()) } else { Ok(()) }
    }
}

#[async_trait]
impl JobRepository for FakeRepo {
    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }

    async fn count_jobs(&self, query: &JobQuery) -> StoreResult<i64> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.jobs.len() as i64)
    }

    async fn list_jobs(&self, query: &JobQuery) -> StoreResult<Vec<JobView>> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.jobs.clone())
    }

    async fn count_by_status(&self) -> StoreResult<Vec<StatusCount>> {
        self.check()?;
        if self.status_counts_fail {
            return Err(unreachable());
        }
        Ok(self.status_counts.clone())
    }

    async fn count_backlog(&self) -> StoreResult<i64> {
        self.check()?;
        if self.backlog_fails {
            return Err(unreachable());
        }
        Ok(self.backlog)
    }

    fn job_urls(&self) -> BoxStream<'_, StoreResult<JobUrlRow>> {
        if self.down {
            return futures::stream::once(async { Err(unreachable()) }).boxed();
        }
        futures::stream::iter(self.urls.clone().into_iter().map(Ok)).boxed()
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<JobRecord>> {
        self.check()?;
        Ok(self.records.get(&id).cloned())
    }
}

/// In-memory cache that hands out SCAN pages two keys at a time
#[derive(Default)]
struct FakeCache {
    down: bool,
    scan_fails: bool,
    counters: HashMap<String, i64>,
    keys: Vec<String>,
}

#[async_trait]
impl CacheStore for FakeCache {
    async fn get_counter(&self, key: &str) -> Result<Option<i64>, CacheError> {
        if self.down {
            return Err(CacheError::Closed);
        }
        Ok(self.counters.get(key).copied())
    }

    async fn scan(&self, cursor: u64, pattern: &str, _count: usize) -> Result<ScanPage, CacheError> {
        if self.scan_fails && cursor > 0 {
            return Err(CacheError::Closed);
        }
        let prefix = pattern.trim_end_matches('*');
        let matching: Vec<String> = self
            .keys
            .iter()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        let start = cursor as usize;
        let end = (start + 2).min(matching.len());
        let next = if end >= matching.len() { 0 } else { end as u64 };

        Ok(ScanPage {
            cursor: next,
            keys: matching[start..end].to_vec(),
        })
    }
}

fn build_test_app(repo: FakeRepo, cache: FakeCache) -> (Router, Arc<FakeRepo>) {
    let repo = Arc::new(repo);
    let state = AppState::new(Config::default(), repo.clone(), Arc::new(cache));
    (build_router(state), repo)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app.oneshot(get(uri)).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

fn job_view(status: &str, url: &str) -> JobView {
    JobView {
        id: Uuid::new_v4(),
        status: status.to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        finished_at: None,
        priority: 10,
        url: Some(url.to_string()),
        mode: Some("single_urls".to_string()),
        team_id: Some("team-1".to_string()),
        crawl_id: None,
        origin: Some("api".to_string()),
        failed_reason: None,
        owner_id: None,
        group_id: None,
    }
}

#[tokio::test]
async fn test_health_reports_service() {
    let (app, _) = build_test_app(FakeRepo::default(), FakeCache::default());

    let (status, body) = send(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "queuewatch");
    assert!(body["timestamp"].is_string());
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn test_health_unreachable_database() {
    let repo = FakeRepo {
        down: true,
        ..Default::default()
    };
    let (app, _) = build_test_app(repo, FakeCache::default());

    let (status, body) = send(app, "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_list_jobs_defaults() {
    let repo = FakeRepo {
        jobs: vec![
            job_view("completed", "https://a.com/x"),
            job_view("queued", "https://b.com/y"),
        ],
        ..Default::default()
    };
    let (app, repo) = build_test_app(repo, FakeCache::default());

    let (status, body) = send(app, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["data"]["pagination"],
        json!({"total": 2, "limit": 100, "offset": 0, "returned": 2})
    );
    let first = &body["data"]["jobs"][0];
    assert_eq!(first["url"], "https://a.com/x");
    assert_eq!(first["origin"], "api");
    assert!(first["finished_at"].is_null());

    let queries = repo.queries.lock().unwrap();
    assert!(queries.iter().all(|q| !q.sql.contains("WHERE")));
}

#[tokio::test]
async fn test_list_jobs_coerces_and_binds_parameters() {
    let (app, repo) = build_test_app(FakeRepo::default(), FakeCache::default());

    let (status, body) = send(
        app,
        "/status?limit=5000&offset=-3&status=completed&order=url;DROP&direction=ASC",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["limit"], 1000);
    assert_eq!(body["data"]["pagination"]["offset"], 0);

    let queries = repo.queries.lock().unwrap();
    let list = queries
        .iter()
        .find(|q| q.sql.contains("LIMIT"))
        .expect("list query issued");
    assert!(list.sql.contains("ORDER BY created_at ASC"));
    assert!(!list.sql.contains("DROP"));
    assert_eq!(
        list.params,
        vec![
            QueryParam::Text("completed".to_string()),
            QueryParam::Int(1000),
            QueryParam::Int(0),
        ]
    );
}

#[tokio::test]
async fn test_stats_merges_backlog() {
    let mut counters = HashMap::new();
    counters.insert("global:crawl_cache:stats:hits".to_string(), 3);
    counters.insert("global:crawl_cache:stats:misses".to_string(), 1);
    counters.insert("global:crawl_cache:stats:stores".to_string(), 4);
    let cache = FakeCache {
        counters,
        keys: vec![
            "global:crawl_cache:https://a.com/x".to_string(),
            "global:crawl_cache:stats:hits".to_string(),
            "global:crawl_cache:https://b.com/y".to_string(),
            "other:key".to_string(),
            "global:crawl_cache:https://c.com/z".to_string(),
        ],
        ..Default::default()
    };
    let repo = FakeRepo {
        status_counts: vec![
            StatusCount {
                status: "completed".to_string(),
                count: 2,
            },
            StatusCount {
                status: "failed".to_string(),
                count: 1,
            },
        ],
        backlog: 3,
        ..Default::default()
    };
    let (app, _) = build_test_app(repo, cache);

    let (status, body) = send(app, "/status/stats").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(
        data["queue_stats"],
        json!({"completed": 2, "failed": 1, "backlog": 3})
    );
    assert_eq!(data["total_jobs"], 6);
    assert_eq!(
        data["cache_stats"],
        json!({
            "enabled": true,
            "hits": 3,
            "misses": 1,
            "stores": 4,
            "cached_urls": 3,
            "total_requests": 4,
            "hit_rate_percent": 75.0
        })
    );
}

#[tokio::test]
async fn test_stats_with_cache_down_still_succeeds() {
    let cache = FakeCache {
        down: true,
        ..Default::default()
    };
    let (app, _) = build_test_app(FakeRepo::default(), cache);

    let (status, body) = send(app, "/status/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["queue_stats"], json!({"backlog": 0}));
    assert_eq!(body["data"]["cache_stats"]["enabled"], false);
    assert_eq!(body["data"]["cache_stats"]["error"], "cache connection closed");
}

#[tokio::test]
async fn test_stats_scan_failure_reports_unknown_count() {
    let cache = FakeCache {
        scan_fails: true,
        keys: (0..5).map(|i| format!("global:crawl_cache:url-{i}")).collect(),
        ..Default::default()
    };
    let (app, _) = build_test_app(FakeRepo::default(), cache);

    let (status, body) = send(app, "/status/stats").await;

    assert_eq!(status, StatusCode::OK);
    let cache_stats = &body["data"]["cache_stats"];
    assert_eq!(cache_stats["enabled"], true);
    assert_eq!(cache_stats["cached_urls"], -1);
    assert_eq!(cache_stats["hit_rate_percent"], 0.0);
}

#[tokio::test]
async fn test_stats_database_down_is_internal_error() {
    let repo = FakeRepo {
        down: true,
        ..Default::default()
    };
    let (app, _) = build_test_app(repo, FakeCache::default());

    let (status, body) = send(app, "/status/stats").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_stats_single_failing_count_is_internal_error() {
    let one_sided = [
        FakeRepo {
            backlog_fails: true,
            backlog: 3,
            ..Default::default()
        },
        FakeRepo {
            status_counts_fail: true,
            backlog: 3,
            ..Default::default()
        },
    ];

    for repo in one_sided {
        let (app, _) = build_test_app(repo, FakeCache::default());

        let (status, body) = send(app, "/status/stats").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body.get("data").is_none());
    }
}

#[tokio::test]
async fn test_repeated_query_keys_use_first_value() {
    let (app, repo) = build_test_app(FakeRepo::default(), FakeCache::default());

    let (status, body) = send(
        app.clone(),
        "/status?limit=10&limit=20&order=created_at&order=priority",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["pagination"]["limit"], 10);
    {
        let queries = repo.queries.lock().unwrap();
        let list = queries.iter().find(|q| q.sql.contains("LIMIT")).unwrap();
        assert!(list.sql.contains("ORDER BY created_at DESC"));
    }

    let (status, body) = send(app, "/status/domains?limit=5&limit=7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metadata"]["limit"], 5);
}

#[tokio::test]
async fn test_domains_rollup() {
    let finished = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
    let row = |url: Option<&str>, status: &str| JobUrlRow {
        url: url.map(str::to_string),
        status: status.to_string(),
        finished_at: (status != "queued").then_some(finished),
    };
    let repo = FakeRepo {
        urls: vec![
            row(Some("http://a.com/x"), "completed"),
            row(Some("https://www.a.com/y"), "completed"),
            row(Some("https://b.org"), "failed"),
            row(Some("https://c.net/q"), "queued"),
            row(None, "completed"),
        ],
        ..Default::default()
    };
    let (app, _) = build_test_app(repo, FakeCache::default());

    let (status, body) = send(app, "/status/domains?limit=2").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["metadata"], json!({"limit": 2, "returned": 2}));
    assert_eq!(data["domains"][0]["domain"], "a.com");
    assert_eq!(data["domains"][0]["total_jobs"], 2);
    assert_eq!(data["domains"][0]["completed_jobs"], 2);
    assert_eq!(data["domains"][0]["failed_jobs"], 0);
    assert!(data["domains"][0]["last_finished_at"].is_string());
    assert_eq!(data["domains"][1]["domain"], "b.org");
}

#[tokio::test]
async fn test_domains_limit_is_clamped() {
    let (app, _) = build_test_app(FakeRepo::default(), FakeCache::default());

    let (_, body) = send(app.clone(), "/status/domains?limit=0").await;
    assert_eq!(body["data"]["metadata"]["limit"], 1);

    let (_, body) = send(app.clone(), "/status/domains?limit=999").await;
    assert_eq!(body["data"]["metadata"]["limit"], 200);

    let (_, body) = send(app, "/status/domains?limit=abc").await;
    assert_eq!(body["data"]["metadata"]["limit"], 25);
    assert_eq!(body["data"]["domains"], json!([]));
}

#[tokio::test]
async fn test_get_job_returns_full_payload() {
    let id = Uuid::parse_str(KNOWN_JOB).unwrap();
    let record = JobRecord {
        id,
        status: "failed".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        finished_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 5, 0).unwrap()),
        priority: 5,
        data: Some(json!({"url": "https://a.com", "mode": "crawl", "scrapeOptions": {"formats": ["markdown"]}})),
        failed_reason: Some("timeout".to_string()),
        owner_id: None,
        group_id: None,
    };
    let repo = FakeRepo {
        records: HashMap::from([(id, record)]),
        ..Default::default()
    };
    let (app, _) = build_test_app(repo, FakeCache::default());

    let (status, body) = send(app, &format!("/status/{KNOWN_JOB}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], KNOWN_JOB);
    assert_eq!(body["data"]["failed_reason"], "timeout");
    assert_eq!(
        body["data"]["data"]["scrapeOptions"]["formats"][0],
        "markdown"
    );
}

#[tokio::test]
async fn test_get_job_unknown_is_not_found() {
    let (app, _) = build_test_app(FakeRepo::default(), FakeCache::default());

    let (status, body) = send(app.clone(), &format!("/status/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Job not found");

    let (status, body) = send(app.clone(), "/status/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found");

    let (status, body) = send(app, "/status/%FF").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Job not found");
}

#[tokio::test]
async fn test_index_describes_endpoints() {
    let (app, _) = build_test_app(FakeRepo::default(), FakeCache::default());

    let (status, body) = send(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], "queuewatch");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["data"]["endpoints"]["GET /status"]["parameters"]["limit"].is_string());
}

#[tokio::test]
async fn test_cors_headers_present() {
    let (app, _) = build_test_app(FakeRepo::default(), FakeCache::default());

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://dashboard.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
