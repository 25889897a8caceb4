//! Worker handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use devgrid_core::WorkerId;
use devgrid_proto::pb::controller_frame::Payload as ControllerPayload;
use devgrid_proto::pb::{self, ControllerFrame};

use crate::http::responses::{ErrorResponse, UpdateWorkerRequest, WorkerResponse};
use crate::state::AppState;

/// List all known workers.
pub async fn list_workers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let connected = state.registry.connected().await;
    let mut response = Vec::new();
    for record in state.store.workers().await {
        let is_connected = connected.contains(&record.id);
        response.push(WorkerResponse::from_record(record, is_connected));
    }
    Json(response)
}

/// Get a single worker.
pub async fn get_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let worker_id = WorkerId::new(id);
    match state.store.worker(&worker_id).await {
        Some(record) => {
            let connected = state.registry.sender_for(&worker_id).await.is_some();
            Json(WorkerResponse::from_record(record, connected)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Worker not found: {worker_id}"),
            }),
        )
            .into_response(),
    }
}

/// Update a worker's role/capabilities and push the new assignment to its
/// live channel, if any.
pub async fn update_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateWorkerRequest>,
) -> impl IntoResponse {
    let worker_id = WorkerId::new(id);
    let updated = state
        .store
        .update_worker(
            &worker_id,
            Box::new(move |record| {
                if let Some(role) = request.role {
                    record.role = role;
                }
                if let Some(capabilities) = request.capabilities {
                    record.capabilities = capabilities;
                }
                true
            }),
        )
        .await;
    let Some((record, _)) = updated else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Worker not found: {worker_id}"),
            }),
        )
            .into_response();
    };

    info!(
        worker_id = %record.id,
        role = %record.role,
        capabilities = ?record.capabilities,
        "Worker assignment updated"
    );

    // Best-effort push; an offline worker picks the assignment up in its
    // next Registered reply.
    if let Some(handle) = state.registry.sender_for(&worker_id).await {
        handle.try_send(ControllerFrame {
            payload: Some(ControllerPayload::ConfigUpdated(pb::ConfigUpdated {
                worker_id: record.id.as_str().to_string(),
                role: record.role.clone(),
                capabilities: record.capabilities.clone(),
            })),
        });
    }

    let connected = state.registry.sender_for(&worker_id).await.is_some();
    Json(WorkerResponse::from_record(record, connected)).into_response()
}
