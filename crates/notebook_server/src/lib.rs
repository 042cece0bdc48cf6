//! HTTP surface for the execution handlers.
//!
//! One endpoint per language. Handler-reported failures (denylist
//! rejections) come back as 400 with the full envelope in the body;
//! validation failures as 400 with a bare `{"error": ...}`; anything the
//! handlers cannot express becomes a logged 500 with a generic message.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use notebook_api::{ExecuteCodeRequest, ExecuteQueryRequest, ExecutionResponse, SqlResponse};
use notebook_core::backend::{DisconnectedBackend, DuckDbBackend, QueryBackend};
use notebook_core::language::Language;
use notebook_core::{analysis, profiles, sql, util};

async fn health() -> &'static str {
    "ok"
}

#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn QueryBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }
}

fn error_body(message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": message }))
}

fn run_code(language: Language, body: ExecuteCodeRequest) -> Response {
    let Some(code) = body.code.as_deref().filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, error_body("Code is required")).into_response();
    };
    let Some(profile) = profiles::profile_for(language) else {
        tracing::error!(%language, "no classification profile registered");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Internal server error"),
        )
            .into_response();
    };
    let result = analysis::analyze(profile, code);
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(ExecutionResponse::from_result(&result))).into_response()
}

async fn execute_python(Json(body): Json<ExecuteCodeRequest>) -> Response {
    run_code(Language::Python, body)
}

async fn execute_r(Json(body): Json<ExecuteCodeRequest>) -> Response {
    run_code(Language::R, body)
}

async fn execute_scala(Json(body): Json<ExecuteCodeRequest>) -> Response {
    run_code(Language::Scala, body)
}

async fn execute_sql(
    State(state): State<AppState>,
    Json(body): Json<ExecuteQueryRequest>,
) -> Response {
    let Some(query) = body.query.as_deref().filter(|q| !q.is_empty()) else {
        return (StatusCode::BAD_REQUEST, error_body("Query is required")).into_response();
    };
    let outcome = sql::run_sql(state.backend.as_ref(), query);
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(SqlResponse::from_outcome(&outcome))).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/execute-python", post(execute_python))
        .route("/execute-sql", post(execute_sql))
        .route("/execute-r", post(execute_r))
        .route("/execute-scala", post(execute_scala))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Attach the local analytics store if one can be opened; otherwise serve
/// disconnected, which lets select queries fall through to the simulated
/// result set.
pub fn open_default_backend() -> Arc<dyn QueryBackend> {
    match util::default_db_path().and_then(|path| {
        let backend = DuckDbBackend::open(&path)?;
        Ok((path, backend))
    }) {
        Ok((path, backend)) => {
            tracing::info!(db = %path.display(), "analytics store attached");
            Arc::new(backend)
        }
        Err(err) => {
            tracing::warn!(%err, "analytics store unavailable, serving disconnected");
            Arc::new(DisconnectedBackend)
        }
    }
}

pub async fn serve() -> anyhow::Result<()> {
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let app = router(AppState::new(open_default_backend()));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!(%addr, "notebook_server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
