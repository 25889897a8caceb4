//! Project handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use devgrid_core::Project;

use crate::http::responses::{CreateProjectRequest, ProjectResponse};
use crate::state::AppState;

/// Create a project.
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    let project = Project::new(request.name, request.root_path);
    state.store.upsert_project(project.clone()).await;

    info!(project_id = %project.id, name = %project.name, "Project created");

    (StatusCode::CREATED, Json(ProjectResponse::from(project)))
}

/// List all projects.
pub async fn list_projects(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let projects: Vec<ProjectResponse> = state
        .store
        .projects()
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    Json(projects)
}
