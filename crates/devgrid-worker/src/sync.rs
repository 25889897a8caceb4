//! Sync flush and acknowledgement handling.
//!
//! Delivery is at-least-once: every session, entry, and terminal task
//! report still flagged unsynced is re-pushed on each reconnect, and the
//! controller collapses replays by id. Flags clear only when the matching
//! `SyncAck` comes back.

use std::sync::Arc;

use tracing::{debug, warn};

use devgrid_proto::pb::worker_frame::Payload as WorkerPayload;
use devgrid_proto::pb::{SyncAck, WorkerFrame};

use crate::connection::{task_status_frame, Outbound};
use crate::tracelog::TraceLog;

pub const ACK_KIND_SESSION: &str = "session";
pub const ACK_KIND_ENTRY: &str = "entry";
pub const ACK_KIND_REPORT: &str = "report";

/// Push every unsynced session, entry, and task report over the current
/// channel.
///
/// Sessions go first so entries never reference a session the controller
/// has not seen yet.
pub async fn flush_unsynced(log: Arc<TraceLog>, outbound: Arc<Outbound>) {
    let snapshot = {
        let log = log.clone();
        tokio::task::spawn_blocking(move || {
            let sessions = log.unsynced_sessions()?;
            let entries = log.unsynced_entries()?;
            let reports = log.unsynced_reports()?;
            Ok::<_, crate::tracelog::TraceLogError>((sessions, entries, reports))
        })
        .await
    };

    let (sessions, entries, reports) = match snapshot {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to read unsynced records");
            return;
        }
        Err(e) => {
            warn!(error = %e, "Sync flush task failed");
            return;
        }
    };

    if sessions.is_empty() && entries.is_empty() && reports.is_empty() {
        return;
    }
    debug!(
        sessions = sessions.len(),
        entries = entries.len(),
        reports = reports.len(),
        "Flushing unsynced records"
    );

    for session in sessions {
        outbound.try_send(WorkerFrame {
            payload: Some(WorkerPayload::TraceSession(session.into())),
        });
    }
    for entry in entries {
        outbound.try_send(WorkerFrame {
            payload: Some(WorkerPayload::TraceEntry(entry.into())),
        });
    }
    for report in reports {
        outbound.try_send(task_status_frame(
            report.task_id.as_str(),
            report.status,
            report.result,
            report.error,
        ));
    }
}

/// Clear the unsynced flag for the acked record.
pub fn handle_ack(log: Arc<TraceLog>, ack: SyncAck) {
    tokio::task::spawn_blocking(move || {
        let result = match ack.kind.as_str() {
            ACK_KIND_SESSION => log.mark_session_synced(&ack.id),
            ACK_KIND_ENTRY => log.mark_entry_synced(&ack.id),
            ACK_KIND_REPORT => log.mark_report_synced(&ack.id),
            other => {
                warn!(kind = %other, id = %ack.id, "Unknown sync ack kind");
                return;
            }
        };
        if let Err(e) = result {
            warn!(id = %ack.id, error = %e, "Failed to mark record synced");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgrid_core::{SessionStatus, TaskId, TraceEntry, WorkerId};
    use devgrid_proto::pb::worker_frame::Payload;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn flush_sends_sessions_before_entries() {
        let log = Arc::new(TraceLog::open(None).unwrap());
        let session = log
            .create_session(TaskId::new("t1"), WorkerId::new("w1"))
            .unwrap();
        log.append_entry(&TraceEntry::step(session.id.clone(), "s", "c"))
            .unwrap();

        let outbound = Outbound::new();
        let (tx, mut rx) = mpsc::channel(8);
        outbound.bind_for_test(tx);

        flush_unsynced(log, outbound).await;

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.payload, Some(Payload::TraceSession(_))));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.payload, Some(Payload::TraceEntry(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unacked_task_report_replays_until_acked() {
        let log = Arc::new(TraceLog::open(None).unwrap());
        log.record_report(&crate::tracelog::PendingReport {
            task_id: TaskId::new("t1"),
            status: devgrid_core::TaskStatus::Failed,
            result: None,
            error: Some("boom".to_string()),
        })
        .unwrap();

        let outbound = Outbound::new();
        let (tx, mut rx) = mpsc::channel(8);
        outbound.bind_for_test(tx);

        flush_unsynced(log.clone(), outbound.clone()).await;
        let frame = rx.recv().await.unwrap();
        match frame.payload {
            Some(Payload::TaskStatus(report)) => {
                assert_eq!(report.task_id, "t1");
                assert_eq!(report.error.as_deref(), Some("boom"));
            }
            other => panic!("expected a task status frame, got {other:?}"),
        }

        handle_ack(
            log.clone(),
            SyncAck {
                kind: ACK_KIND_REPORT.to_string(),
                id: "t1".to_string(),
            },
        );
        for _ in 0..50 {
            if log.unsynced_reports().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(log.unsynced_reports().unwrap().is_empty());

        flush_unsynced(log, outbound).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn ack_clears_the_flag_so_replay_stops() {
        let log = Arc::new(TraceLog::open(None).unwrap());
        let session = log
            .create_session(TaskId::new("t1"), WorkerId::new("w1"))
            .unwrap();
        log.close_session(&session.id, SessionStatus::Completed)
            .unwrap();

        handle_ack(
            log.clone(),
            SyncAck {
                kind: ACK_KIND_SESSION.to_string(),
                id: session.id.as_str().to_string(),
            },
        );

        // spawn_blocking completes independently of this task
        for _ in 0..50 {
            if log.unsynced_sessions().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(log.unsynced_sessions().unwrap().is_empty());

        let outbound = Outbound::new();
        let (tx, mut rx) = mpsc::channel(8);
        outbound.bind_for_test(tx);
        flush_unsynced(log, outbound).await;
        assert!(rx.try_recv().is_err());
    }
}
