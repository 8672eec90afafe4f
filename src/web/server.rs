//! Axum HTTP API for archviz

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::AnalysisCache;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::facts::{visual_facts, Analysis, AnalyzeResult, VisualFacts};
use crate::output::{paths_view, reachable_view, PathsView, ReachableView};

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<AnalysisCache>,
    /// Root used by call-graph queries that do not name one
    pub default_root: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: Config, default_root: Option<PathBuf>) -> Self {
        let cache = AnalysisCache::new(&config.cache);
        Self {
            config: Arc::new(config),
            cache: Arc::new(cache),
            default_root,
        }
    }

    fn root_or_default(&self, root: Option<String>) -> std::result::Result<PathBuf, ApiError> {
        root.map(PathBuf::from)
            .or_else(|| self.default_root.clone())
            .ok_or_else(|| {
                ApiError::bad_request("No root given and the server has no default root")
            })
    }

    /// Analysis of `root`, computed off the async runtime and cached
    async fn analysis(&self, root: PathBuf) -> std::result::Result<Arc<Analysis>, ApiError> {
        let cache = Arc::clone(&self.cache);
        let scan = self.config.scan.clone();
        tokio::task::spawn_blocking(move || cache.get_or_analyze(&root, &scan))
            .await
            .map_err(|e| ApiError::internal(format!("Analysis task failed: {}", e)))?
            .map_err(ApiError::from)
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RootRequest {
    pub root_path: String,
}

#[derive(Debug, Deserialize)]
pub struct CallgraphQuery {
    pub symbol: String,
    #[serde(rename = "maxDepth")]
    pub max_depth: Option<usize>,
    pub root: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PathsQuery {
    pub start: String,
    pub end: String,
    #[serde(rename = "maxDepth")]
    pub max_depth: Option<usize>,
    pub root: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Error body: `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_user_error() {
            Self::bad_request(err.to_string())
        } else {
            warn!(error = %err, "Request failed");
            Self::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// =============================================================================
// HANDLERS
// =============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /analyze - facts, summaries, failures and diagnostics
pub async fn api_analyze(
    State(state): State<AppState>,
    Json(req): Json<RootRequest>,
) -> ApiResult<AnalyzeResult> {
    let analysis = state.analysis(PathBuf::from(req.root_path)).await?;
    Ok(Json(analysis.result.clone()))
}

/// POST /facts - module/package graph for visualization
pub async fn api_facts(
    State(state): State<AppState>,
    Json(req): Json<RootRequest>,
) -> ApiResult<VisualFacts> {
    let analysis = state.analysis(PathBuf::from(req.root_path)).await?;
    Ok(Json(visual_facts(&analysis.result.facts)))
}

/// GET /callgraph?symbol=S&maxDepth=N[&root=R]
pub async fn api_callgraph(
    State(state): State<AppState>,
    Query(query): Query<CallgraphQuery>,
) -> ApiResult<ReachableView> {
    let root = state.root_or_default(query.root)?;
    let max_depth = query
        .max_depth
        .unwrap_or(state.config.query.default_max_depth);
    let analysis = state.analysis(root).await?;

    debug!(symbol = %query.symbol, max_depth, "Reachability query");
    Ok(Json(reachable_view(
        &analysis.call_graph,
        &query.symbol,
        max_depth,
    )))
}

/// GET /callgraph/paths?start=A&end=B&maxDepth=N[&root=R]
pub async fn api_paths(
    State(state): State<AppState>,
    Query(query): Query<PathsQuery>,
) -> ApiResult<PathsView> {
    let root = state.root_or_default(query.root)?;
    let max_depth = query
        .max_depth
        .unwrap_or(state.config.query.default_max_depth);
    let analysis = state.analysis(root).await?;

    debug!(start = %query.start, end = %query.end, max_depth, "Path query");
    Ok(Json(paths_view(
        &analysis.call_graph,
        &query.start,
        &query.end,
        max_depth,
        state.config.query.max_paths,
    )))
}

// =============================================================================
// SERVER
// =============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(api_analyze))
        .route("/facts", post(api_facts))
        .route("/callgraph", get(api_callgraph))
        .route("/callgraph/paths", get(api_paths))
        .with_state(state)
}

pub async fn run(config: Config, default_root: Option<PathBuf>) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, default_root);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::ServerError {
            message: format!("Failed to bind {}: {}", addr, e),
        })?;

    info!(%addr, "archviz API listening");
    eprintln!("\x1b[36m>\x1b[0m archviz API running at \x1b[36mhttp://{}\x1b[0m", addr);
    eprintln!("\x1b[90m  Press Ctrl+C to stop\x1b[0m");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
