//! ChannelService implementation: the worker-facing bidirectional stream.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tonic::{Request, Response, Status, Streaming};
use tracing::{info, warn};

use devgrid_core::{TaskId, WorkerId};
use devgrid_proto::pb::controller_frame::Payload as ControllerPayload;
use devgrid_proto::pb::worker_frame::Payload as WorkerPayload;
use devgrid_proto::pb::{self, ControllerFrame, WorkerFrame};
use devgrid_proto::{ChannelService, ChannelServiceServer};

use crate::dispatch::{self, TaskReport};
use crate::presence;
use crate::registry::ChannelHandle;
use crate::state::AppState;
use crate::sync;

/// Per-connection outbound buffer depth.
const OUTBOUND_BUFFER: usize = 32;

/// ChannelService implementation.
pub struct ChannelServiceImpl {
    state: Arc<AppState>,
}

impl ChannelServiceImpl {
    /// Create a new ChannelServiceImpl.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Convert into a tonic server.
    pub fn into_server(self) -> ChannelServiceServer<Self> {
        ChannelServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl ChannelService for ChannelServiceImpl {
    type OpenStream =
        Pin<Box<dyn tokio_stream::Stream<Item = Result<ControllerFrame, Status>> + Send>>;

    async fn open(
        &self,
        request: Request<Streaming<WorkerFrame>>,
    ) -> Result<Response<Self::OpenStream>, Status> {
        let mut inbound = request.into_inner();
        let state = self.state.clone();

        // Per-connection outbound buffer to the worker.
        let (tx, rx) = mpsc::channel::<ControllerFrame>(OUTBOUND_BUFFER);
        let handle = ChannelHandle::new(tx);
        let connection_id = handle.connection_id.clone();

        // Bound identity, established by the Register frame.
        let bound: Arc<Mutex<Option<WorkerId>>> = Arc::new(Mutex::new(None));
        let bound_clone = bound.clone();

        tokio::spawn(async move {
            while let Some(result) = inbound.next().await {
                match result {
                    Ok(frame) => {
                        if let Some(payload) = frame.payload {
                            handle_frame(&state, &bound_clone, &handle, payload).await;
                        }
                    }
                    Err(e) => {
                        warn!(connection_id = %handle.connection_id, error = %e, "Stream error");
                        break;
                    }
                }
            }

            // Channel closed. If this connection was tagged with a worker id
            // and is still the authoritative one, force the worker offline.
            if let Some(worker_id) = bound_clone.lock().await.take() {
                presence::disconnect(&state, &worker_id, &handle.connection_id).await;
            }
        });

        info!(connection_id = %connection_id, "Channel opened");

        let outbound = ReceiverStream::new(rx).map(Ok);
        Ok(Response::new(Box::pin(outbound)))
    }
}

async fn handle_frame(
    state: &Arc<AppState>,
    bound: &Arc<Mutex<Option<WorkerId>>>,
    handle: &ChannelHandle,
    payload: WorkerPayload,
) {
    match payload {
        WorkerPayload::Register(register) => {
            let registered = presence::register(state, register.into(), handle.clone()).await;
            let worker_id = registered.worker_id;

            // Tag this connection with the resolved identity for cleanup.
            *bound.lock().await = Some(worker_id.clone());

            let reply = ControllerFrame {
                payload: Some(ControllerPayload::Registered(pb::Registered {
                    worker_id: worker_id.as_str().to_string(),
                    role: registered.role,
                    capabilities: registered.capabilities,
                })),
            };
            handle.try_send(reply);

            // Redelivery goes out strictly after the Registered reply: the
            // worker only learns its id from that frame, and it drops any
            // assignment it cannot recognize as its own.
            let redelivered = dispatch::redeliver_pending(state, &worker_id).await;
            if redelivered > 0 {
                info!(
                    worker_id = %worker_id,
                    count = redelivered,
                    "Redelivered pending tasks on reconnect"
                );
            }
        }
        WorkerPayload::Heartbeat(hb) => {
            let worker_id = WorkerId::new(hb.worker_id);
            presence::heartbeat(state, &worker_id).await;

            let ack = ControllerFrame {
                payload: Some(ControllerPayload::HeartbeatAck(pb::HeartbeatAck {
                    timestamp_ms: chrono::Utc::now().timestamp_millis(),
                })),
            };
            handle.try_send(ack);
        }
        WorkerPayload::StatusReport(report) => {
            let worker_id = WorkerId::new(report.worker_id);
            let status = pb::WorkerStatus::try_from(report.status)
                .unwrap_or(pb::WorkerStatus::Unspecified)
                .into();
            presence::report_status(state, &worker_id, status, report.current_context).await;
        }
        WorkerPayload::TaskStatus(report) => {
            let status = pb::TaskStatus::try_from(report.status)
                .unwrap_or(pb::TaskStatus::Unspecified)
                .into();
            let task_id = TaskId::new(report.task_id);
            dispatch::report_task_status(
                state,
                TaskReport {
                    task_id: task_id.clone(),
                    status,
                    result: report.result,
                    error: report.error,
                },
            )
            .await;
            // Always acked, so the worker can retire its persisted copy;
            // replays collapse against the task's current status.
            sync::ack_report(handle, task_id.as_str());
        }
        WorkerPayload::TraceSession(record) => {
            sync::apply_session(state, record.into(), handle).await;
        }
        WorkerPayload::TraceEntry(record) => {
            sync::apply_entry(state, record.into(), handle).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgrid_core::{Project, TaskDraft, TaskStatus};
    use tokio::sync::mpsc;

    fn fake_handle() -> (ChannelHandle, mpsc::Receiver<ControllerFrame>) {
        let (tx, rx) = mpsc::channel(32);
        (ChannelHandle::new(tx), rx)
    }

    fn register_payload(name: &str) -> WorkerPayload {
        WorkerPayload::Register(pb::Register {
            name: name.to_string(),
            worker_type: "codegen".to_string(),
            os: "linux".to_string(),
            address: String::new(),
            metadata: Default::default(),
        })
    }

    fn drain(rx: &mut mpsc::Receiver<ControllerFrame>) -> Vec<ControllerPayload> {
        let mut payloads = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            if let Some(payload) = frame.payload {
                payloads.push(payload);
            }
        }
        payloads
    }

    #[tokio::test]
    async fn registered_reply_precedes_redelivered_assignments() {
        let state = AppState::new();
        let project = Project::new("app", "/srv/app");
        let project_id = project.id.clone();
        state.store.upsert_project(project).await;

        // first contact establishes the identity, then the channel dies
        let (h1, rx1) = fake_handle();
        let bound = Arc::new(Mutex::new(None));
        handle_frame(&state, &bound, &h1, register_payload("beta")).await;
        let worker_id = bound.lock().await.clone().unwrap();
        drop(rx1);
        presence::disconnect(&state, &worker_id, &h1.connection_id).await;

        // a task created while beta is away stays pending
        let outcome = dispatch::create_and_dispatch(
            &state,
            worker_id.clone(),
            project_id,
            TaskDraft::new("t", "d"),
        )
        .await
        .unwrap();
        assert!(!outcome.dispatched);

        // A restarted worker only learns its id from Registered; an
        // assignment sent ahead of it would be dropped as another worker's.
        let (h2, mut rx2) = fake_handle();
        let bound = Arc::new(Mutex::new(None));
        handle_frame(&state, &bound, &h2, register_payload("beta")).await;

        let payloads = drain(&mut rx2);
        let registered_at = payloads
            .iter()
            .position(|p| matches!(p, ControllerPayload::Registered(_)))
            .expect("no Registered frame");
        let assigned_at = payloads
            .iter()
            .position(|p| matches!(p, ControllerPayload::TaskAssigned(_)))
            .expect("no TaskAssigned frame");
        assert!(registered_at < assigned_at);

        match &payloads[assigned_at] {
            ControllerPayload::TaskAssigned(a) => {
                assert_eq!(a.task_id, outcome.task.id.as_str())
            }
            _ => unreachable!(),
        }
        assert_eq!(
            state.store.task(&outcome.task.id).await.unwrap().status,
            TaskStatus::Dispatched
        );
    }

    #[tokio::test]
    async fn task_status_report_is_acked_even_on_replay() {
        let state = AppState::new();
        let project = Project::new("app", "/srv/app");
        let project_id = project.id.clone();
        state.store.upsert_project(project).await;

        let (handle, mut rx) = fake_handle();
        let bound = Arc::new(Mutex::new(None));
        handle_frame(&state, &bound, &handle, register_payload("alpha")).await;
        let worker_id = bound.lock().await.clone().unwrap();

        let outcome = dispatch::create_and_dispatch(
            &state,
            worker_id,
            project_id,
            TaskDraft::new("t", "d"),
        )
        .await
        .unwrap();
        drain(&mut rx);

        let report = WorkerPayload::TaskStatus(pb::TaskStatusReport {
            task_id: outcome.task.id.as_str().to_string(),
            status: pb::TaskStatus::Completed as i32,
            result: Some("done".to_string()),
            error: None,
        });
        handle_frame(&state, &bound, &handle, report.clone()).await;
        handle_frame(&state, &bound, &handle, report).await;

        // Both deliveries acked; the replay left the record alone.
        let acks: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|p| match p {
                ControllerPayload::SyncAck(ack) => Some(ack),
                _ => None,
            })
            .collect();
        assert_eq!(acks.len(), 2);
        for ack in acks {
            assert_eq!(ack.kind, sync::ACK_KIND_REPORT);
            assert_eq!(ack.id, outcome.task.id.as_str());
        }

        let stored = state.store.task(&outcome.task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.result.as_deref(), Some("done"));
    }
}
