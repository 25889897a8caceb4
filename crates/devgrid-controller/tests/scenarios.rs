//! End-to-end controller scenarios, driving presence and dispatch directly
//! with mpsc channel handles standing in for live worker streams.

use std::sync::Arc;

use tokio::sync::mpsc;

use devgrid_controller::dispatch::{self, TaskReport};
use devgrid_controller::notify::Notification;
use devgrid_controller::presence;
use devgrid_controller::registry::ChannelHandle;
use devgrid_controller::state::AppState;

use devgrid_core::{Project, ProjectId, TaskDraft, TaskStatus, WorkerDescriptor, WorkerStatus};
use devgrid_proto::pb::controller_frame::Payload;
use devgrid_proto::pb::{ControllerFrame, TaskAssigned};

fn fake_channel() -> (ChannelHandle, mpsc::Receiver<ControllerFrame>) {
    let (tx, rx) = mpsc::channel(32);
    (ChannelHandle::new(tx), rx)
}

async fn seeded_project(state: &Arc<AppState>) -> ProjectId {
    let project = Project::new("app", "/srv/app");
    let id = project.id.clone();
    state.store.upsert_project(project).await;
    id
}

/// Drain the receiver and return every TaskAssigned observed.
fn drain_assignments(rx: &mut mpsc::Receiver<ControllerFrame>) -> Vec<TaskAssigned> {
    let mut assigned = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Some(Payload::TaskAssigned(a)) = frame.payload {
            assigned.push(a);
        }
    }
    assigned
}

#[tokio::test]
async fn alpha_scenario_connected_dispatch_to_completion() {
    let state = AppState::new();
    let project_id = seeded_project(&state).await;

    // alpha registers
    let (handle, mut rx) = fake_channel();
    let registered = presence::register(&state, WorkerDescriptor::new("alpha"), handle).await;
    let worker_id = registered.worker_id.clone();
    assert_eq!(registered.role, "runner");

    // heartbeats keep the record fresh
    presence::heartbeat(&state, &worker_id).await;
    let record = state.store.worker(&worker_id).await.unwrap();
    assert_eq!(record.status, WorkerStatus::Online);

    // controller creates t1 targeted at alpha while connected
    let outcome = dispatch::create_and_dispatch(
        &state,
        worker_id.clone(),
        project_id,
        TaskDraft::new("t1", "implement the feature"),
    )
    .await
    .unwrap();
    assert!(outcome.dispatched);
    assert_eq!(outcome.task.status, TaskStatus::Dispatched);

    // alpha observes the payload exactly once on its own channel
    let assignments = drain_assignments(&mut rx);
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].task_id, outcome.task.id.as_str());

    // alpha reports completion
    dispatch::report_task_status(
        &state,
        TaskReport {
            task_id: outcome.task.id.clone(),
            status: TaskStatus::Completed,
            result: Some("merged".to_string()),
            error: None,
        },
    )
    .await;

    let stored = state.store.task(&outcome.task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.result.as_deref(), Some("merged"));
}

#[tokio::test]
async fn beta_scenario_offline_dispatch_then_redelivery_on_reconnect() {
    let state = AppState::new();
    let project_id = seeded_project(&state).await;

    // beta registered once, then its channel went away
    let (first_handle, _first_rx) = fake_channel();
    let registered = presence::register(&state, WorkerDescriptor::new("beta"), first_handle).await;
    let worker_id = registered.worker_id.clone();
    let connection_id = state
        .registry
        .sender_for(&worker_id)
        .await
        .unwrap()
        .connection_id;
    presence::disconnect(&state, &worker_id, &connection_id).await;
    assert_eq!(
        state.store.worker(&worker_id).await.unwrap().status,
        WorkerStatus::Offline
    );

    // t2 targeted at beta while disconnected: pending, not dispatched
    let outcome = dispatch::create_and_dispatch(
        &state,
        worker_id.clone(),
        project_id,
        TaskDraft::new("t2", "fix the bug"),
    )
    .await
    .unwrap();
    assert!(!outcome.dispatched);
    assert_eq!(
        state.store.task(&outcome.task.id).await.unwrap().status,
        TaskStatus::Pending
    );

    // beta reconnects; the channel layer redelivers pending tasks after
    // the Registered reply has gone out
    let (handle, mut rx) = fake_channel();
    let reregistered = presence::register(&state, WorkerDescriptor::new("beta"), handle).await;
    assert_eq!(reregistered.worker_id, worker_id);
    let redelivered = dispatch::redeliver_pending(&state, &worker_id).await;
    assert_eq!(redelivered, 1);

    let assignments = drain_assignments(&mut rx);
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].task_id, outcome.task.id.as_str());
    assert_eq!(
        state.store.task(&outcome.task.id).await.unwrap().status,
        TaskStatus::Dispatched
    );
}

#[tokio::test]
async fn broadcast_fallback_reaches_every_connected_channel() {
    let state = AppState::new();
    let project_id = seeded_project(&state).await;

    // target is known but disconnected; two bystanders are connected
    let (target_handle, _target_rx) = fake_channel();
    let target =
        presence::register(&state, WorkerDescriptor::new("target"), target_handle).await;
    let connection_id = state
        .registry
        .sender_for(&target.worker_id)
        .await
        .unwrap()
        .connection_id;
    presence::disconnect(&state, &target.worker_id, &connection_id).await;

    let (h1, mut rx1) = fake_channel();
    presence::register(&state, WorkerDescriptor::new("bystander-1"), h1).await;
    let (h2, mut rx2) = fake_channel();
    presence::register(&state, WorkerDescriptor::new("bystander-2"), h2).await;

    let outcome = dispatch::create_and_dispatch(
        &state,
        target.worker_id.clone(),
        project_id,
        TaskDraft::new("t3", "broadcast me"),
    )
    .await
    .unwrap();
    assert!(!outcome.dispatched);

    // both connected channels saw the fallback with the target embedded
    for rx in [&mut rx1, &mut rx2] {
        let assignments = drain_assignments(rx);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].worker_id, target.worker_id.as_str());
    }
}

#[tokio::test]
async fn double_register_upserts_a_single_record() {
    let state = AppState::new();

    let (h1, _rx1) = fake_channel();
    let first = presence::register(
        &state,
        WorkerDescriptor::new("alpha").with_address("10.0.0.1:0"),
        h1,
    )
    .await;

    let (h2, _rx2) = fake_channel();
    let second = presence::register(
        &state,
        WorkerDescriptor::new("alpha").with_address("10.0.0.2:0"),
        h2,
    )
    .await;

    assert_eq!(first.worker_id, second.worker_id);

    let workers = state.store.workers().await;
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0].address, "10.0.0.2:0");
}

#[tokio::test]
async fn reconnect_evicts_prior_channel_and_its_close_is_harmless() {
    let state = AppState::new();

    let (h1, _rx1) = fake_channel();
    let registered = presence::register(&state, WorkerDescriptor::new("alpha"), h1).await;
    let worker_id = registered.worker_id.clone();
    let old_connection = state
        .registry
        .sender_for(&worker_id)
        .await
        .unwrap()
        .connection_id;

    // reconnect before the old channel times out
    let (h2, _rx2) = fake_channel();
    presence::register(&state, WorkerDescriptor::new("alpha"), h2).await;
    let new_connection = state
        .registry
        .sender_for(&worker_id)
        .await
        .unwrap()
        .connection_id;
    assert_ne!(old_connection, new_connection);

    // the evicted connection's teardown must not knock the worker offline
    presence::disconnect(&state, &worker_id, &old_connection).await;
    assert_eq!(
        state.store.worker(&worker_id).await.unwrap().status,
        WorkerStatus::Online
    );
    assert_eq!(
        state
            .registry
            .sender_for(&worker_id)
            .await
            .unwrap()
            .connection_id,
        new_connection
    );
}

#[tokio::test]
async fn status_notifications_fan_out_to_observers() {
    let state = AppState::new();
    let mut events = state.notifier.subscribe();

    let (handle, _rx) = fake_channel();
    let registered = presence::register(&state, WorkerDescriptor::new("alpha"), handle).await;

    match events.recv().await.unwrap() {
        Notification::WorkerStatusChanged {
            worker_id,
            name,
            status,
            ..
        } => {
            assert_eq!(worker_id, registered.worker_id);
            assert_eq!(name, "alpha");
            assert_eq!(status, WorkerStatus::Online);
        }
        other => panic!("unexpected notification: {other:?}"),
    }

    presence::report_status(
        &state,
        &registered.worker_id,
        WorkerStatus::Working,
        Some("t1: building".to_string()),
    )
    .await;

    match events.recv().await.unwrap() {
        Notification::WorkerStatusChanged {
            status,
            current_context,
            ..
        } => {
            assert_eq!(status, WorkerStatus::Working);
            assert_eq!(current_context.as_deref(), Some("t1: building"));
        }
        other => panic!("unexpected notification: {other:?}"),
    }
}
