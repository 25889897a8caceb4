//! Presence operations: registration, heartbeats, status reports and
//! disconnects.
//!
//! Registration is an upsert by worker *name*: first contact creates the
//! record, later contacts refresh it. Channel close and the liveness reaper
//! are the only transitions to Offline.

use std::sync::Arc;

use tracing::{info, warn};

use devgrid_core::{WorkerDescriptor, WorkerId, WorkerRecord, WorkerStatus};
use devgrid_proto::pb::controller_frame::Payload as ControllerPayload;
use devgrid_proto::pb::{self, ControllerFrame};

use crate::notify::Notification;
use crate::registry::ChannelHandle;
use crate::state::AppState;

/// Registration reply: the resolved identity and current assignment.
#[derive(Debug, Clone)]
pub struct Registered {
    pub worker_id: WorkerId,
    pub role: String,
    pub capabilities: Vec<String>,
}

/// Handle a `Register` frame: upsert the worker by name, bind the channel
/// (evicting any prior one) and announce the status change. Redelivery of
/// pending tasks happens at the channel layer, after the `Registered` reply
/// is on the wire.
pub async fn register(
    state: &Arc<AppState>,
    descriptor: WorkerDescriptor,
    handle: ChannelHandle,
) -> Registered {
    let record = match state.store.worker_by_name(&descriptor.name).await {
        Some(mut existing) => {
            existing.refresh_from(descriptor);
            existing
        }
        None => WorkerRecord::from_descriptor(descriptor),
    };
    state.store.upsert_worker(record.clone()).await;

    let evicted = state.registry.bind(record.id.clone(), handle).await;
    if let Some(stale) = evicted {
        info!(
            worker_id = %record.id,
            stale_connection = %stale.connection_id,
            "Replaced prior channel for reconnecting worker"
        );
        // Dropping the stale handle closes its outbound stream.
    }

    info!(
        worker_id = %record.id,
        name = %record.name,
        worker_type = %record.worker_type,
        os = %record.os,
        "Worker registered"
    );

    emit_worker_status(state, &record).await;

    Registered {
        worker_id: record.id,
        role: record.role,
        capabilities: record.capabilities,
    }
}

/// Handle a heartbeat: touch last-contact and promote an Offline record back
/// to Online (a heartbeat can outrun re-registration after a reaper pass).
pub async fn heartbeat(state: &Arc<AppState>, worker_id: &WorkerId) {
    let updated = state
        .store
        .update_worker(
            worker_id,
            Box::new(|record| {
                record.touch();
                if record.status == WorkerStatus::Offline {
                    record.status = WorkerStatus::Online;
                    true
                } else {
                    false
                }
            }),
        )
        .await;

    let Some((record, came_back)) = updated else {
        warn!(worker_id = %worker_id, "Heartbeat from unknown worker");
        return;
    };
    if came_back {
        emit_worker_status(state, &record).await;
    }
}

/// Handle a fire-and-forget status report (idle/working + context).
pub async fn report_status(
    state: &Arc<AppState>,
    worker_id: &WorkerId,
    status: WorkerStatus,
    current_context: Option<String>,
) {
    let updated = state
        .store
        .update_worker(
            worker_id,
            Box::new(move |record| {
                let changed =
                    record.status != status || record.current_context != current_context;
                record.status = status;
                record.current_context = current_context;
                record.touch();
                changed
            }),
        )
        .await;

    let Some((record, changed)) = updated else {
        warn!(worker_id = %worker_id, "Status report from unknown worker");
        return;
    };
    if changed {
        emit_worker_status(state, &record).await;
    }
}

/// Handle channel close. Only the authoritative connection may force the
/// worker Offline; a stale connection's teardown after a reconnect is a
/// no-op.
pub async fn disconnect(state: &Arc<AppState>, worker_id: &WorkerId, connection_id: &str) {
    if !state.registry.unbind_if(worker_id, connection_id).await {
        return;
    }

    let updated = state
        .store
        .update_worker(
            worker_id,
            Box::new(|record| {
                record.status = WorkerStatus::Offline;
                record.current_context = None;
                true
            }),
        )
        .await;

    let Some((record, _)) = updated else {
        return;
    };

    info!(worker_id = %worker_id, name = %record.name, "Worker disconnected");
    emit_worker_status(state, &record).await;
}

/// Announce a worker status change to every observer and mirror it to every
/// live channel.
pub(crate) async fn emit_worker_status(state: &Arc<AppState>, record: &WorkerRecord) {
    state.notifier.emit(Notification::WorkerStatusChanged {
        worker_id: record.id.clone(),
        name: record.name.clone(),
        status: record.status,
        current_context: record.current_context.clone(),
    });

    let frame = ControllerFrame {
        payload: Some(ControllerPayload::WorkerStatusChanged(
            pb::WorkerStatusChanged {
                worker_id: record.id.as_str().to_string(),
                name: record.name.clone(),
                status: pb::WorkerStatus::from(record.status) as i32,
                current_context: record.current_context.clone(),
            },
        )),
    };
    state.registry.broadcast(frame).await;
}
