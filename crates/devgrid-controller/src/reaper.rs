//! Liveness reaper: demotes workers to Offline after a contact timeout.
//!
//! The safety net for workers that vanish without a clean close. Each pass
//! compares wall clock against `last_seen_at` only; the channel object may
//! already be gone, so channel liveness is never consulted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use devgrid_core::WorkerStatus;

use crate::presence;
use crate::state::AppState;

/// Run reap passes on a fixed period until the process exits.
pub async fn run(state: Arc<AppState>, period: Duration, stale_after: chrono::Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately; skip it so a controller restart does
    // not instantly reap workers that were connected before the restart.
    interval.tick().await;

    loop {
        interval.tick().await;
        let reaped = reap_once(&state, stale_after).await;
        if reaped > 0 {
            info!(count = reaped, "Reaped stale workers");
        } else {
            debug!("Reap pass found no stale workers");
        }
    }
}

/// One reap pass: force every non-Offline worker whose last contact is older
/// than `stale_after` to Offline, emitting exactly one status notification
/// per transition. Returns the number of workers reaped.
pub async fn reap_once(state: &Arc<AppState>, stale_after: chrono::Duration) -> usize {
    let cutoff = Utc::now() - stale_after;
    let mut reaped = 0;

    for candidate in state.store.workers().await {
        if candidate.status == WorkerStatus::Offline || candidate.last_seen_at >= cutoff {
            continue;
        }

        // Re-check under the write lock: a heartbeat may have landed since
        // the snapshot above, and it must win.
        let updated = state
            .store
            .update_worker(
                &candidate.id,
                Box::new(move |record| {
                    if record.status == WorkerStatus::Offline || record.last_seen_at >= cutoff {
                        return false;
                    }
                    record.status = WorkerStatus::Offline;
                    record.current_context = None;
                    true
                }),
            )
            .await;

        let Some((record, went_stale)) = updated else {
            continue;
        };
        if !went_stale {
            continue;
        }

        info!(
            worker_id = %record.id,
            name = %record.name,
            last_seen_at = %record.last_seen_at,
            "Worker stale, forcing offline"
        );
        presence::emit_worker_status(state, &record).await;
        reaped += 1;
    }

    reaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notification;
    use devgrid_core::{WorkerDescriptor, WorkerRecord};

    async fn seed_worker(state: &Arc<AppState>, name: &str, seen_secs_ago: i64) -> WorkerRecord {
        let mut record = WorkerRecord::from_descriptor(WorkerDescriptor::new(name));
        record.last_seen_at = Utc::now() - chrono::Duration::seconds(seen_secs_ago);
        state.store.upsert_worker(record.clone()).await;
        record
    }

    #[tokio::test]
    async fn stale_worker_goes_offline_exactly_once() {
        let state = AppState::new();
        let stale = seed_worker(&state, "stale", 600).await;
        seed_worker(&state, "fresh", 10).await;
        let mut events = state.notifier.subscribe();

        let threshold = chrono::Duration::seconds(300);
        assert_eq!(reap_once(&state, threshold).await, 1);

        let record = state.store.worker(&stale.id).await.unwrap();
        assert_eq!(record.status, WorkerStatus::Offline);

        match events.try_recv().unwrap() {
            Notification::WorkerStatusChanged { worker_id, status, .. } => {
                assert_eq!(worker_id, stale.id);
                assert_eq!(status, WorkerStatus::Offline);
            }
            other => panic!("unexpected notification: {other:?}"),
        }

        // A second pass over the same stale period is a no-op.
        assert_eq!(reap_once(&state, threshold).await, 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn already_offline_workers_are_skipped() {
        let state = AppState::new();
        let mut record = seed_worker(&state, "gone", 600).await;
        record.status = WorkerStatus::Offline;
        state.store.upsert_worker(record).await;

        assert_eq!(reap_once(&state, chrono::Duration::seconds(300)).await, 0);
    }
}
