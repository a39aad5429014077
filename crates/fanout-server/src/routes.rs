use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::dto::{
    HealthResponse, ProgressResponse, ResultsResponse, SessionListResponse, SessionResponse,
    SubmitUrlsResponse, WorkersResponse, parse_submission,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/submit-urls", post(submit_urls))
        .route("/results", get(get_results))
        .route("/results/{session_id}", get(get_session_results))
        .route("/workers", get(get_workers))
        .route("/progress", get(get_progress))
        .route("/sessions", get(list_sessions))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/submit-urls",
    request_body = crate::dto::SubmitUrlsRequest,
    responses(
        (status = 200, description = "Session opened and URLs enqueued", body = SubmitUrlsResponse),
        (status = 500, description = "Store unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "crawl"
)]
pub async fn submit_urls(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // An unreadable or oversized body is an empty submission, not an error.
    let urls = match body {
        Ok(body) => parse_submission(&body),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Unreadable submission body");
            Vec::new()
        }
    };
    let outcome = state.coordinator.submit(urls).await?;
    Ok(axum::Json(SubmitUrlsResponse::from(outcome)))
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/results",
    responses(
        (status = 200, description = "Legacy process-wide results", body = ResultsResponse),
        (status = 500, description = "Store unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "results"
)]
pub async fn get_results(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let results = state.coordinator.get_results().await?;
    Ok(axum::Json(ResultsResponse { results }))
}

#[utoipa::path(
    get,
    path = "/results/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session ID returned by /submit-urls")
    ),
    responses(
        (status = 200, description = "Results for one session; empty for unknown sessions", body = ResultsResponse),
        (status = 500, description = "Store unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "results"
)]
pub async fn get_session_results(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state.coordinator.get_session_results(&session_id).await?;
    Ok(axum::Json(ResultsResponse { results }))
}

// ---------------------------------------------------------------------------
// Monitoring
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/workers",
    responses(
        (status = 200, description = "Last published status of every worker", body = WorkersResponse),
        (status = 500, description = "Store unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "monitoring"
)]
pub async fn get_workers(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let workers = state.coordinator.get_workers().await?;
    Ok(axum::Json(WorkersResponse { workers }))
}

#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "Global crawl progress", body = ProgressResponse),
        (status = 500, description = "Store unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "monitoring"
)]
pub async fn get_progress(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let progress = state.coordinator.get_progress().await?;
    Ok(axum::Json(ProgressResponse::from(progress)))
}

#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Every session in submission order", body = SessionListResponse),
        (status = 500, description = "Store unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "monitoring"
)]
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.coordinator.list_sessions().await?;
    Ok(axum::Json(SessionListResponse {
        sessions: sessions.into_iter().map(SessionResponse::from).collect(),
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.coordinator.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(HealthResponse {
                status: "healthy",
                store: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(HealthResponse {
                    status: "unhealthy",
                    store: "error",
                }),
            )
        }
    }
}
