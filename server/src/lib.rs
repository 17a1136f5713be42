use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use beacon_core::CrawlConfig;
use beacon_crawler::CancelHandle;
use beacon_index::scorer::HttpScorer;
use beacon_index::SearchIndex;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use url::Url;
use uuid::Uuid;

/// Relation threshold applied when the semantic scorer is in play.
const MIN_RELATION_SCORE: f64 = 0.05;
const MAX_QUERY_CHARS: usize = 512;

pub type SharedIndex = Arc<SearchIndex<HttpScorer>>;

#[derive(Clone, Debug)]
pub enum JobStatus {
    Initializing,
    Running,
    Completed,
    Failed(String),
    Stopping,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Initializing => write!(f, "initializing"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed(msg) => write!(f, "failed: {msg}"),
            JobStatus::Stopping => write!(f, "stopping"),
        }
    }
}

pub struct JobEntry {
    pub status: JobStatus,
    pub cancel: CancelHandle,
}

#[derive(Clone)]
pub struct AppState {
    pub index: SharedIndex,
    pub jobs: Arc<RwLock<HashMap<Uuid, JobEntry>>>,
}

impl AppState {
    pub fn new(index: SharedIndex) -> Self {
        Self {
            index,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    pub base_urls: Vec<String>,
    pub worker_count: usize,
    pub task_count: usize,
    #[serde(default)]
    pub max_links_in_page: usize,
    #[serde(default)]
    pub max_depth_crawl: usize,
    #[serde(default)]
    pub only_same_domain: bool,
    #[serde(default)]
    pub rate: u32,
}

#[derive(Serialize)]
pub struct CrawlResponse {
    pub job_id: Uuid,
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct StopRequest {
    pub job_id: Uuid,
}

#[derive(Serialize)]
pub struct StopResponse {
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct StatusParams {
    pub job_id: Uuid,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub pages_crawled: u32,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_results: usize,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub url: String,
    pub description: String,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/crawl/start", post(start_crawl))
        .route("/crawl/stop", post(stop_crawl))
        .route("/crawl/status", get(crawl_status))
        .route("/search", post(search))
        .with_state(state)
        .layer(cors)
}

/// Accept http(s) URLs with a host; anything else is skipped with a log
/// line, mirroring how bad seeds are reported to the operator.
fn validate_seed(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url.to_string())
}

async fn start_crawl(
    State(state): State<AppState>,
    Json(req): Json<CrawlRequest>,
) -> Result<Json<CrawlResponse>, (StatusCode, String)> {
    let mut seeds = Vec::new();
    for raw in &req.base_urls {
        match validate_seed(raw) {
            Ok(url) => seeds.push(url),
            Err(err) => state.index.write(&format!("invalid url {raw}: {err}")),
        }
    }
    if seeds.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no valid seed urls".to_string()));
    }

    let config = CrawlConfig {
        base_urls: seeds,
        workers: req.worker_count,
        tasks: req.task_count,
        max_links_in_page: req.max_links_in_page,
        max_depth: req.max_depth_crawl,
        only_same_domain: req.only_same_domain,
        rate: req.rate,
        timeout_secs: 90,
    };
    config
        .validate()
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    let job_id = Uuid::new_v4();
    let cancel = CancelHandle::new();
    state.jobs.write().insert(
        job_id,
        JobEntry {
            status: JobStatus::Initializing,
            cancel: cancel.clone(),
        },
    );

    let index = state.index.clone();
    let jobs = state.jobs.clone();
    tokio::spawn(async move {
        set_status(&jobs, job_id, JobStatus::Running);
        let outcome = index.index(&config, cancel.token()).await;
        match outcome {
            Ok(()) => set_status(&jobs, job_id, JobStatus::Completed),
            Err(err) => {
                tracing::error!(%job_id, %err, "crawl job failed");
                set_status(&jobs, job_id, JobStatus::Failed(err.to_string()));
            }
        }
    });

    Ok(Json(CrawlResponse {
        job_id,
        status: "started",
    }))
}

fn set_status(jobs: &RwLock<HashMap<Uuid, JobEntry>>, job_id: Uuid, status: JobStatus) {
    if let Some(entry) = jobs.write().get_mut(&job_id) {
        entry.status = status;
    }
}

async fn stop_crawl(State(state): State<AppState>, Json(req): Json<StopRequest>) -> Json<StopResponse> {
    let mut jobs = state.jobs.write();
    let Some(entry) = jobs.get_mut(&req.job_id) else {
        return Json(StopResponse { status: "not_found" });
    };
    entry.cancel.cancel();
    entry.status = JobStatus::Stopping;
    Json(StopResponse { status: "stopped" })
}

async fn crawl_status(State(state): State<AppState>, Query(params): Query<StatusParams>) -> Json<StatusResponse> {
    let jobs = state.jobs.read();
    let Some(entry) = jobs.get(&params.job_id) else {
        return Json(StatusResponse {
            status: "not_found".to_string(),
            pages_crawled: 0,
        });
    };
    Json(StatusResponse {
        status: entry.status.to_string(),
        pages_crawled: state.index.urls_crawled(),
    })
}

async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>, (StatusCode, String)> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "empty query".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err((StatusCode::BAD_REQUEST, "query too long".to_string()));
    }

    let results = state
        .index
        .search(query, MIN_RELATION_SCORE, req.max_results)
        .await;
    Ok(Json(
        results
            .into_iter()
            .map(|doc| SearchResult {
                url: doc.url,
                description: doc.description,
            })
            .collect(),
    ))
}
