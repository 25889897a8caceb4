//! Dispatch engine: task creation, targeted delivery with broadcast
//! fallback, and worker status reports.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use devgrid_core::{ProjectId, Task, TaskDraft, TaskId, TaskStatus, WorkerId};
use devgrid_proto::pb::controller_frame::Payload as ControllerPayload;
use devgrid_proto::pb::ControllerFrame;

use crate::notify::Notification;
use crate::state::AppState;

/// Synchronous rejections at task-creation time. Everything else is a
/// recorded outcome, never an error.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Worker not found: {0}")]
    WorkerNotFound(WorkerId),

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),
}

/// Result of a create-and-dispatch call. `dispatched` distinguishes
/// "delivered" from "queued, will deliver on reconnect" for the caller.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub task: Task,
    pub dispatched: bool,
}

/// Worker-reported task status fields.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub error: Option<String>,
}

fn assignment_frame(task: &Task) -> ControllerFrame {
    ControllerFrame {
        payload: Some(ControllerPayload::TaskAssigned(task.into())),
    }
}

/// Create a task targeted at one worker and attempt delivery.
///
/// The task is persisted before any delivery attempt; persistence is
/// guaranteed, delivery is best-effort. A direct push to the target's live
/// channel marks the task Dispatched. With no live channel (or a full
/// buffer) the payload is broadcast to every connected channel with the
/// intended worker id embedded, so a worker whose registration is in flight
/// can still self-select it, and the task stays Pending.
pub async fn create_and_dispatch(
    state: &Arc<AppState>,
    worker_id: WorkerId,
    project_id: ProjectId,
    draft: TaskDraft,
) -> Result<DispatchOutcome, DispatchError> {
    if state.store.worker(&worker_id).await.is_none() {
        return Err(DispatchError::WorkerNotFound(worker_id));
    }
    if state.store.project(&project_id).await.is_none() {
        return Err(DispatchError::ProjectNotFound(project_id));
    }

    let mut task = Task::new(worker_id.clone(), project_id, draft);
    state.store.upsert_task(task.clone()).await;

    let delivered = match state.registry.sender_for(&worker_id).await {
        Some(handle) => handle.try_send(assignment_frame(&task)),
        None => false,
    };

    let dispatched = if delivered {
        if let Some(updated) = mark_dispatched_if_pending(state, &task.id).await {
            task = updated;
        }
        info!(task_id = %task.id, worker_id = %worker_id, "Task dispatched to live channel");
        true
    } else {
        let reached = state.registry.broadcast(assignment_frame(&task)).await;
        info!(
            task_id = %task.id,
            worker_id = %worker_id,
            broadcast_channels = reached,
            "Target channel unavailable, task queued with broadcast fallback"
        );
        false
    };

    state.notifier.emit(Notification::TaskCreated {
        task: task.clone(),
        dispatched,
    });

    Ok(DispatchOutcome { task, dispatched })
}

/// Stamp a task Dispatched if it is still Pending at the moment the write
/// lock is held. A worker-reported terminal status that raced in first is
/// left untouched. Returns the updated task when the stamp applied.
async fn mark_dispatched_if_pending(state: &Arc<AppState>, task_id: &TaskId) -> Option<Task> {
    let (task, applied) = state
        .store
        .update_task(
            task_id,
            Box::new(|task| task.apply_report(TaskStatus::Dispatched, None, None).is_ok()),
        )
        .await?;
    applied.then_some(task)
}

/// Apply a worker-reported task status. Accepted from any channel; the
/// record is updated under the store's write lock and a notification
/// emitted, with no reporter validation. An unknown task id is logged and
/// dropped, as is a report the current status rejects (replays of a
/// terminal report land here and stay harmless).
pub async fn report_task_status(state: &Arc<AppState>, report: TaskReport) {
    let status = report.status;
    let updated = state
        .store
        .update_task(
            &report.task_id,
            Box::new(move |task| {
                task.apply_report(status, report.result, report.error).is_ok()
            }),
        )
        .await;

    let Some((task, applied)) = updated else {
        warn!(task_id = %report.task_id, "Status report for unknown task");
        return;
    };
    if !applied {
        debug!(
            task_id = %task.id,
            current = ?task.status,
            reported = ?status,
            "Ignoring task status report"
        );
        return;
    }

    info!(
        task_id = %task.id,
        worker_id = %task.worker_id,
        status = ?task.status,
        "Task status updated"
    );

    state.notifier.emit(Notification::TaskStatusChanged {
        task_id: task.id,
        status: task.status,
    });
}

/// Push every stored Pending task targeted at `worker_id` over its freshly
/// bound channel. Safe to repeat: the worker-side queue deduplicates by
/// task id. Returns how many tasks were pushed.
pub async fn redeliver_pending(state: &Arc<AppState>, worker_id: &WorkerId) -> usize {
    let pending = state.store.pending_tasks_for(worker_id).await;
    if pending.is_empty() {
        return 0;
    }

    let Some(handle) = state.registry.sender_for(worker_id).await else {
        return 0;
    };

    let mut delivered = 0;
    for task in pending {
        if handle.try_send(assignment_frame(&task)) {
            // The Pending guard keeps a completion report that arrived
            // between the snapshot and this update from being regressed.
            if let Some(task) = mark_dispatched_if_pending(state, &task.id).await {
                state.notifier.emit(Notification::TaskStatusChanged {
                    task_id: task.id,
                    status: task.status,
                });
            }
            delivered += 1;
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ChannelHandle;
    use devgrid_core::{Project, WorkerDescriptor, WorkerRecord};
    use devgrid_proto::pb::controller_frame::Payload;
    use tokio::sync::mpsc;

    async fn seeded_state() -> (Arc<AppState>, WorkerId, ProjectId) {
        let state = AppState::new();
        let worker = WorkerRecord::from_descriptor(WorkerDescriptor::new("alpha"));
        let worker_id = worker.id.clone();
        state.store.upsert_worker(worker).await;

        let project = Project::new("app", "/srv/app");
        let project_id = project.id.clone();
        state.store.upsert_project(project).await;

        (state, worker_id, project_id)
    }

    fn expect_assignment(
        rx: &mut mpsc::Receiver<ControllerFrame>,
    ) -> devgrid_proto::pb::TaskAssigned {
        match rx.try_recv().expect("expected a frame").payload {
            Some(Payload::TaskAssigned(assigned)) => assigned,
            other => panic!("expected TaskAssigned, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_worker_is_rejected_without_persisting() {
        let state = AppState::new();
        let result = create_and_dispatch(
            &state,
            WorkerId::new("ghost"),
            ProjectId::new("p"),
            TaskDraft::new("t", "d"),
        )
        .await;

        assert!(matches!(result, Err(DispatchError::WorkerNotFound(_))));
        assert!(state.store.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn live_channel_gets_direct_delivery_exactly_once() {
        let (state, worker_id, project_id) = seeded_state().await;
        let (tx, mut rx) = mpsc::channel(8);
        state
            .registry
            .bind(worker_id.clone(), ChannelHandle::new(tx))
            .await;

        let outcome = create_and_dispatch(&state, worker_id, project_id, TaskDraft::new("t", "d"))
            .await
            .unwrap();

        assert!(outcome.dispatched);
        assert_eq!(outcome.task.status, TaskStatus::Dispatched);

        let assigned = expect_assignment(&mut rx);
        assert_eq!(assigned.task_id, outcome.task.id.as_str());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn no_channel_falls_back_to_broadcast_and_stays_pending() {
        let (state, worker_id, project_id) = seeded_state().await;

        // A different worker is connected; the target is not.
        let other = WorkerRecord::from_descriptor(WorkerDescriptor::new("bystander"));
        let other_id = other.id.clone();
        state.store.upsert_worker(other).await;
        let (tx, mut rx) = mpsc::channel(8);
        state.registry.bind(other_id, ChannelHandle::new(tx)).await;

        let outcome = create_and_dispatch(
            &state,
            worker_id.clone(),
            project_id,
            TaskDraft::new("t", "d"),
        )
        .await
        .unwrap();

        assert!(!outcome.dispatched);
        assert_eq!(outcome.task.status, TaskStatus::Pending);

        // The bystander saw the broadcast with the intended target embedded.
        let assigned = expect_assignment(&mut rx);
        assert_eq!(assigned.worker_id, worker_id.as_str());

        let stored = state.store.task(&outcome.task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn task_created_notification_fires_regardless_of_delivery() {
        let (state, worker_id, project_id) = seeded_state().await;
        let mut events = state.notifier.subscribe();

        create_and_dispatch(&state, worker_id, project_id, TaskDraft::new("t", "d"))
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            Notification::TaskCreated { dispatched, .. } => assert!(!dispatched),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn completion_report_updates_record() {
        let (state, worker_id, project_id) = seeded_state().await;
        let outcome = create_and_dispatch(&state, worker_id, project_id, TaskDraft::new("t", "d"))
            .await
            .unwrap();

        report_task_status(
            &state,
            TaskReport {
                task_id: outcome.task.id.clone(),
                status: TaskStatus::Completed,
                result: Some("done".to_string()),
                error: None,
            },
        )
        .await;

        let stored = state.store.task(&outcome.task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.result.as_deref(), Some("done"));
        assert!(stored.finished_at.is_some());
    }

    #[tokio::test]
    async fn dispatch_stamp_cannot_regress_a_completed_task() {
        let (state, worker_id, project_id) = seeded_state().await;
        let outcome = create_and_dispatch(&state, worker_id, project_id, TaskDraft::new("t", "d"))
            .await
            .unwrap();

        report_task_status(
            &state,
            TaskReport {
                task_id: outcome.task.id.clone(),
                status: TaskStatus::Completed,
                result: Some("done".to_string()),
                error: None,
            },
        )
        .await;

        // A dispatch stamp racing in after the terminal report is a no-op.
        assert!(mark_dispatched_if_pending(&state, &outcome.task.id)
            .await
            .is_none());

        let stored = state.store.task(&outcome.task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.result.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn replayed_terminal_report_is_ignored_without_notification() {
        let (state, worker_id, project_id) = seeded_state().await;
        let outcome = create_and_dispatch(&state, worker_id, project_id, TaskDraft::new("t", "d"))
            .await
            .unwrap();

        let report = TaskReport {
            task_id: outcome.task.id.clone(),
            status: TaskStatus::Completed,
            result: Some("done".to_string()),
            error: None,
        };
        report_task_status(&state, report.clone()).await;

        let mut events = state.notifier.subscribe();
        report_task_status(&state, report).await;
        assert!(events.try_recv().is_err());

        let stored = state.store.task(&outcome.task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn redelivery_pushes_pending_tasks_in_creation_order() {
        let (state, worker_id, project_id) = seeded_state().await;

        let first = create_and_dispatch(
            &state,
            worker_id.clone(),
            project_id.clone(),
            TaskDraft::new("first", "d"),
        )
        .await
        .unwrap();
        let second = create_and_dispatch(
            &state,
            worker_id.clone(),
            project_id,
            TaskDraft::new("second", "d"),
        )
        .await
        .unwrap();
        assert!(!first.dispatched);
        assert!(!second.dispatched);

        let (tx, mut rx) = mpsc::channel(8);
        state
            .registry
            .bind(worker_id.clone(), ChannelHandle::new(tx))
            .await;

        let count = redeliver_pending(&state, &worker_id).await;
        assert_eq!(count, 2);

        assert_eq!(expect_assignment(&mut rx).task_id, first.task.id.as_str());
        assert_eq!(expect_assignment(&mut rx).task_id, second.task.id.as_str());

        for id in [&first.task.id, &second.task.id] {
            assert_eq!(
                state.store.task(id).await.unwrap().status,
                TaskStatus::Dispatched
            );
        }
    }
}
