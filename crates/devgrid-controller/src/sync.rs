//! Ingestion of offline-first trace records.
//!
//! Workers push trace sessions and entries with producer-assigned ids; the
//! controller applies each as a pure upsert keyed by that id and always
//! replies with a `SyncAck`. A replay after a dropped ack therefore
//! collapses to a no-op overwrite, never a duplicate.

use std::sync::Arc;

use tracing::debug;

use devgrid_core::{TraceEntry, TraceSession};
use devgrid_proto::pb::controller_frame::Payload as ControllerPayload;
use devgrid_proto::pb::{ControllerFrame, SyncAck};

use crate::registry::ChannelHandle;
use crate::state::AppState;

/// Ack kind for session records.
pub const ACK_KIND_SESSION: &str = "session";
/// Ack kind for entry records.
pub const ACK_KIND_ENTRY: &str = "entry";
/// Ack kind for task status reports (keyed by task id).
pub const ACK_KIND_REPORT: &str = "report";

fn ack_frame(kind: &str, id: &str) -> ControllerFrame {
    ControllerFrame {
        payload: Some(ControllerPayload::SyncAck(SyncAck {
            kind: kind.to_string(),
            id: id.to_string(),
        })),
    }
}

/// Ack a task status report on the reporting channel. Sent for every
/// report, applied or not: the worker persists terminal reports until this
/// arrives, and a replay collapses against the task's current status.
pub fn ack_report(reply: &ChannelHandle, task_id: &str) {
    reply.try_send(ack_frame(ACK_KIND_REPORT, task_id));
}

/// Upsert a trace session and ack it on the reporting channel.
pub async fn apply_session(state: &Arc<AppState>, session: TraceSession, reply: &ChannelHandle) {
    debug!(
        session_id = %session.id,
        task_id = %session.task_id,
        status = ?session.status,
        "Trace session upsert"
    );

    let id = session.id.as_str().to_string();
    state.store.upsert_session(session).await;
    reply.try_send(ack_frame(ACK_KIND_SESSION, &id));
}

/// Upsert a trace entry and ack it on the reporting channel.
pub async fn apply_entry(state: &Arc<AppState>, entry: TraceEntry, reply: &ChannelHandle) {
    debug!(
        entry_id = %entry.id,
        session_id = %entry.session_id,
        kind = ?entry.kind,
        "Trace entry upsert"
    );

    let id = entry.id.as_str().to_string();
    state.store.upsert_entry(entry).await;
    reply.try_send(ack_frame(ACK_KIND_ENTRY, &id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgrid_core::{SessionStatus, TaskId, WorkerId};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn session_replay_is_a_noop_upsert_with_ack_each_time() {
        let state = AppState::new();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = ChannelHandle::new(tx);

        let mut session = TraceSession::open(TaskId::new("t1"), WorkerId::new("w1"));
        apply_session(&state, session.clone(), &handle).await;

        // Replay after a dropped ack, now closed.
        session.close(SessionStatus::Completed);
        apply_session(&state, session.clone(), &handle).await;

        let stored = state.store.session(&session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert_eq!(state.store.sessions_for_task(&session.task_id).await.len(), 1);

        // Both pushes were acked.
        for _ in 0..2 {
            match rx.try_recv().unwrap().payload {
                Some(ControllerPayload::SyncAck(ack)) => {
                    assert_eq!(ack.kind, ACK_KIND_SESSION);
                    assert_eq!(ack.id, session.id.as_str());
                }
                other => panic!("expected SyncAck, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn entry_upsert_keeps_latest_content() {
        let state = AppState::new();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = ChannelHandle::new(tx);

        let session = TraceSession::open(TaskId::new("t1"), WorkerId::new("w1"));
        let entry = TraceEntry::step(session.id.clone(), "build", "running");
        apply_entry(&state, entry.clone(), &handle).await;

        let mut replay = entry.clone();
        replay.content = "finished".to_string();
        apply_entry(&state, replay, &handle).await;

        let entries = state.store.entries_for_session(&session.id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "finished");

        match rx.try_recv().unwrap().payload {
            Some(ControllerPayload::SyncAck(ack)) => assert_eq!(ack.kind, ACK_KIND_ENTRY),
            other => panic!("expected SyncAck, got {other:?}"),
        }
    }
}
