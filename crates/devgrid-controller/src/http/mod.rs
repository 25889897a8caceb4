//! Operator HTTP API.
//!
//! Provides endpoints for:
//! - Worker list / assignment (`/v1/workers`)
//! - Project CRUD (`/v1/projects`)
//! - Task creation and inspection (`/v1/tasks`)
//! - Trace telemetry reads (`/v1/tasks/:id/sessions`, `/v1/sessions/:id/entries`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)
//!
//! When an API token is configured, mutating routes require a matching
//! `Authorization: Bearer` header. Reads and observability stay open.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer for dashboard access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/v1/workers", get(handlers::list_workers))
        .route("/v1/workers/:id", get(handlers::get_worker))
        .route("/v1/workers/:id", patch(handlers::update_worker))
        .route("/v1/projects", post(handlers::create_project))
        .route("/v1/projects", get(handlers::list_projects))
        .route("/v1/tasks", post(handlers::create_task))
        .route("/v1/tasks", get(handlers::list_tasks))
        .route("/v1/tasks/:id", get(handlers::get_task))
        .route("/v1/tasks/:id/sessions", get(handlers::get_task_sessions))
        .route("/v1/sessions/:id/entries", get(handlers::get_session_entries))
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .layer(cors)
        .with_state(state)
}

/// Reject mutating requests without the configured bearer token.
async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_token.as_deref() else {
        return next.run(request).await;
    };
    if request.method() == Method::GET {
        return next.run(request).await;
    }

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false);

    if authorized {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(responses::ErrorResponse {
                error: "missing or invalid bearer token".to_string(),
            }),
        )
            .into_response()
    }
}
