//! Task handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use devgrid_core::{ProjectId, TaskDraft, TaskId, WorkerId};

use crate::dispatch::{self, DispatchError};
use crate::http::responses::{CreateTaskRequest, CreateTaskResponse, ErrorResponse, TaskResponse};
use crate::state::AppState;

/// Create a task and attempt delivery to its target worker.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    let mut draft = TaskDraft::new(request.title, request.description);
    if let Some(task_type) = request.task_type {
        draft = draft.with_task_type(task_type);
    }
    if let Some(work_dir) = request.work_dir {
        draft = draft.with_work_dir(work_dir);
    }

    let outcome = dispatch::create_and_dispatch(
        &state,
        WorkerId::new(request.worker_id),
        ProjectId::new(request.project_id),
        draft,
    )
    .await;

    match outcome {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(CreateTaskResponse {
                task: outcome.task.into(),
                dispatched: outcome.dispatched,
            }),
        )
            .into_response(),
        Err(e @ (DispatchError::WorkerNotFound(_) | DispatchError::ProjectNotFound(_))) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// List all tasks, newest first.
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tasks: Vec<TaskResponse> = state
        .store
        .tasks()
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    Json(tasks)
}

/// Get a single task.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let task_id = TaskId::new(id);
    match state.store.task(&task_id).await {
        Some(task) => Json(TaskResponse::from(task)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Task not found: {task_id}"),
            }),
        )
            .into_response(),
    }
}
