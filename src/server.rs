//! HTTP search endpoint.
//!
//! Serves an initialized [`HipSearch`] session as JSON so a site (or any
//! other client) can query the merged index without loading the feeds
//! itself.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/search?q=<query>&limit=<n>` | Ranked results |
//! | `GET`  | `/health` | Status, version, engine mode and item count |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be >= 1" } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the search page can
//! call the server from another origin.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::models::{ItemStatus, ScoredItem};
use crate::present::ResultView;
use crate::session::{HipSearch, SearchMode, SearchOptions};

/// Initialize a session from `config` and serve it on `[server].bind`.
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let session = HipSearch::new(SearchOptions::from_config(config));
    let mode = session.init().await;
    tracing::info!(mode = mode.as_str(), items = session.len(), "search ready");

    let app = router(Arc::new(session));
    let bind_addr = &config.server.bind;

    println!("HIP search server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes over an already initialized session.
pub fn router(session: Arc<HipSearch>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(session)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        code: "unavailable".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    mode: SearchMode,
    items: usize,
}

async fn handle_health(State(session): State<Arc<HipSearch>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: session.mode(),
        items: session.len(),
    })
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

/// One ranked result with its display fields.
#[derive(Serialize)]
struct SearchHit {
    score: u32,
    status: ItemStatus,
    doc_number: String,
    title: String,
    category: String,
    author: Option<String>,
    display_type: &'static str,
    display_title: String,
    icon: &'static str,
    href: String,
}

impl From<&ScoredItem> for SearchHit {
    fn from(result: &ScoredItem) -> Self {
        let view = ResultView::from_result(result);
        let item = &result.item;
        Self {
            score: result.score,
            status: item.status,
            doc_number: item.doc_number.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            author: item.author.clone(),
            display_type: view.display_type,
            display_title: view.display_title,
            icon: view.icon,
            href: view.href,
        }
    }
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    mode: SearchMode,
    results: Vec<SearchHit>,
}

async fn handle_search(
    State(session): State<Arc<HipSearch>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let limit = params.limit.unwrap_or(session.options().limit);
    if limit < 1 {
        return Err(bad_request("limit must be >= 1"));
    }
    let mode = session.mode();
    if matches!(mode, SearchMode::Uninitialized | SearchMode::Disabled) {
        return Err(unavailable(format!("search is {}", mode.as_str())));
    }

    let results = session
        .search_limited(&params.q, limit)
        .iter()
        .map(SearchHit::from)
        .collect();

    Ok(Json(SearchResponse {
        query: params.q,
        mode,
        results,
    }))
}
