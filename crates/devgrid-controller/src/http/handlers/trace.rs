//! Trace telemetry handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use devgrid_core::{SessionId, TaskId};

use crate::http::responses::{EntryResponse, ErrorResponse, SessionResponse};
use crate::state::AppState;

/// Sessions recorded for a task, in start order.
pub async fn get_task_sessions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let task_id = TaskId::new(id);
    if state.store.task(&task_id).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Task not found: {task_id}"),
            }),
        )
            .into_response();
    }

    let sessions: Vec<SessionResponse> = state
        .store
        .sessions_for_task(&task_id)
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    Json(sessions).into_response()
}

/// Entries of a session, in append order.
pub async fn get_session_entries(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let session_id = SessionId::new(id);
    if state.store.session(&session_id).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session not found: {session_id}"),
            }),
        )
            .into_response();
    }

    let entries: Vec<EntryResponse> = state
        .store
        .entries_for_session(&session_id)
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    Json(entries).into_response()
}
