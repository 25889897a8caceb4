//! Controller channel management.
//!
//! One bidirectional stream to the controller carries everything: the
//! register handshake, heartbeats, task assignments, status reports and
//! trace sync. The channel is fire-and-forget on both sides; durability
//! lives in the local trace log, not here.

use std::sync::Arc;
use std::sync::RwLock as StdRwLock;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use devgrid_core::{WorkerDescriptor, WorkerId, WorkerStatus};
use devgrid_proto::pb::worker_frame::Payload as WorkerPayload;
use devgrid_proto::pb::controller_frame::Payload as ControllerPayload;
use devgrid_proto::pb::{
    Heartbeat, Register, ResourceUsage, StatusReport, TaskStatusReport, WorkerFrame,
};
use devgrid_proto::ChannelServiceClient;

use crate::config::Config;
use crate::queue::TaskQueue;
use crate::sync;
use crate::tracelog::TraceLog;

const OUTBOUND_BUFFER: usize = 64;

/// Handle to the current outbound channel, if any.
///
/// The queue runner and trace recorder outlive individual connections, so
/// they send through this indirection; frames produced while disconnected
/// are dropped. Sessions, entries, and terminal task reports all sit in
/// the local log until acked, so the next flush re-sends them.
#[derive(Default)]
pub struct Outbound {
    tx: StdRwLock<Option<mpsc::Sender<WorkerFrame>>>,
}

impl Outbound {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn bind(&self, tx: mpsc::Sender<WorkerFrame>) {
        if let Ok(mut slot) = self.tx.write() {
            *slot = Some(tx);
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.tx.write() {
            *slot = None;
        }
    }

    /// Send a frame if a channel is up and has capacity.
    pub fn try_send(&self, frame: WorkerFrame) -> bool {
        let tx = match self.tx.read() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        match tx {
            Some(tx) => tx.try_send(frame).is_ok(),
            None => false,
        }
    }

    #[cfg(test)]
    pub fn bind_for_test(&self, tx: mpsc::Sender<WorkerFrame>) {
        self.bind(tx);
    }
}

/// Worker id assigned by the controller at registration.
///
/// Stable for a given name, but only known once the first `Registered`
/// frame arrives.
#[derive(Default)]
pub struct Identity {
    id: StdRwLock<Option<WorkerId>>,
}

impl Identity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, id: WorkerId) {
        if let Ok(mut slot) = self.id.write() {
            *slot = Some(id);
        }
    }

    pub fn get(&self) -> Option<WorkerId> {
        self.id.read().ok().and_then(|slot| slot.clone())
    }
}

/// Build an activity status report frame.
pub fn status_frame(
    worker_id: &WorkerId,
    status: WorkerStatus,
    current_context: Option<String>,
) -> WorkerFrame {
    WorkerFrame {
        payload: Some(WorkerPayload::StatusReport(StatusReport {
            worker_id: worker_id.as_str().to_string(),
            status: devgrid_proto::pb::WorkerStatus::from(status) as i32,
            current_context,
        })),
    }
}

/// Build a task status report frame.
pub fn task_status_frame(
    task_id: &str,
    status: devgrid_core::TaskStatus,
    result: Option<String>,
    error: Option<String>,
) -> WorkerFrame {
    WorkerFrame {
        payload: Some(WorkerPayload::TaskStatus(TaskStatusReport {
            task_id: task_id.to_string(),
            status: devgrid_proto::pb::TaskStatus::from(status) as i32,
            result,
            error,
        })),
    }
}

/// One connection attempt's worth of shared state.
pub struct WorkerConnection {
    config: Arc<Config>,
    log: Arc<TraceLog>,
    queue: Arc<TaskQueue>,
    outbound: Arc<Outbound>,
    identity: Arc<Identity>,
}

impl WorkerConnection {
    pub fn new(
        config: Arc<Config>,
        log: Arc<TraceLog>,
        queue: Arc<TaskQueue>,
        outbound: Arc<Outbound>,
        identity: Arc<Identity>,
    ) -> Self {
        Self {
            config,
            log,
            queue,
            outbound,
            identity,
        }
    }

    /// Connect, register and pump frames until the stream ends.
    pub async fn run_once(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut client = ChannelServiceClient::connect(self.config.controller_addr.clone()).await?;

        let (tx, rx) = mpsc::channel::<WorkerFrame>(OUTBOUND_BUFFER);
        let mut inbound = client
            .open(ReceiverStream::new(rx))
            .await?
            .into_inner();

        tx.send(WorkerFrame {
            payload: Some(WorkerPayload::Register(self.register_frame())),
        })
        .await?;

        self.outbound.bind(tx.clone());
        let mut heartbeat: Option<JoinHandle<()>> = None;

        let result = loop {
            match inbound.message().await {
                Ok(Some(frame)) => {
                    if let Some(payload) = frame.payload {
                        self.handle_frame(payload, &tx, &mut heartbeat);
                    }
                }
                Ok(None) => {
                    info!("Controller closed the channel");
                    break Ok(());
                }
                Err(status) => {
                    warn!(error = %status, "Channel error");
                    break Err(status.into());
                }
            }
        };

        self.outbound.clear();
        if let Some(handle) = heartbeat {
            handle.abort();
        }
        result
    }

    fn register_frame(&self) -> Register {
        let mut descriptor = WorkerDescriptor::new(self.config.worker_name())
            .with_worker_type(&self.config.worker_type);
        if let Some(host) = sysinfo::System::host_name() {
            descriptor = descriptor.with_metadata("hostname", host);
        }
        descriptor = descriptor.with_metadata("cpus", num_cpus_string());
        descriptor.into()
    }

    fn handle_frame(
        &self,
        payload: ControllerPayload,
        tx: &mpsc::Sender<WorkerFrame>,
        heartbeat: &mut Option<JoinHandle<()>>,
    ) {
        match payload {
            ControllerPayload::Registered(registered) => {
                info!(
                    worker_id = %registered.worker_id,
                    role = %registered.role,
                    "Registered with controller"
                );
                let worker_id = WorkerId::new(registered.worker_id);
                self.identity.set(worker_id.clone());

                // One heartbeat loop per connection.
                if let Some(previous) = heartbeat.take() {
                    previous.abort();
                }
                *heartbeat = Some(tokio::spawn(heartbeat_loop(
                    worker_id,
                    tx.clone(),
                    self.config.heartbeat_interval(),
                )));

                // Push everything buffered while offline.
                tokio::spawn(sync::flush_unsynced(
                    self.log.clone(),
                    self.outbound.clone(),
                ));
            }
            ControllerPayload::TaskAssigned(assignment) => {
                // Broadcast fallback frames reach every worker; only the
                // targeted one may act on them.
                let ours = self
                    .identity
                    .get()
                    .is_some_and(|id| id.as_str() == assignment.worker_id);
                if ours {
                    if self.queue.enqueue(assignment) {
                        debug!(depth = self.queue.depth(), "Task queued");
                    }
                } else {
                    debug!(task_id = %assignment.task_id, "Ignoring assignment for another worker");
                }
            }
            ControllerPayload::ConfigUpdated(update) => {
                info!(
                    role = %update.role,
                    capabilities = ?update.capabilities,
                    "Configuration updated by controller"
                );
            }
            ControllerPayload::SyncAck(ack) => {
                sync::handle_ack(self.log.clone(), ack);
            }
            ControllerPayload::HeartbeatAck(_) => {
                debug!("Heartbeat acknowledged");
            }
            ControllerPayload::WorkerStatusChanged(change) => {
                debug!(
                    worker = %change.name,
                    status = change.status,
                    "Fleet status update"
                );
            }
        }
    }
}

fn num_cpus_string() -> String {
    std::thread::available_parallelism()
        .map(|n| n.get().to_string())
        .unwrap_or_else(|_| "1".to_string())
}

async fn heartbeat_loop(
    worker_id: WorkerId,
    tx: mpsc::Sender<WorkerFrame>,
    period: std::time::Duration,
) {
    let mut system = sysinfo::System::new();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        system.refresh_cpu_usage();
        system.refresh_memory();
        let frame = WorkerFrame {
            payload: Some(WorkerPayload::Heartbeat(Heartbeat {
                worker_id: worker_id.as_str().to_string(),
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
                usage: Some(ResourceUsage {
                    cpu_percent: system.global_cpu_usage() as f64,
                    memory_used_bytes: system.used_memory(),
                    memory_total_bytes: system.total_memory(),
                }),
            })),
        };
        if tx.send(frame).await.is_err() {
            debug!("Channel gone, stopping heartbeats");
            break;
        }
    }
}
