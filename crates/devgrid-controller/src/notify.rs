//! Explicit observer fan-out for controller-side state changes.
//!
//! Delivery is a tokio broadcast channel: every subscriber sees every
//! notification, in emission order per worker.

use devgrid_core::{Task, TaskId, TaskStatus, WorkerId, WorkerStatus};
use tokio::sync::broadcast;

/// State-change notification fanned out to all observers.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A worker's liveness or activity status changed.
    WorkerStatusChanged {
        worker_id: WorkerId,
        name: String,
        status: WorkerStatus,
        current_context: Option<String>,
    },

    /// A task was created. Emitted regardless of delivery outcome; the flag
    /// records whether the payload reached the target's live channel.
    TaskCreated { task: Task, dispatched: bool },

    /// A task's status changed (delivery or worker report).
    TaskStatusChanged { task_id: TaskId, status: TaskStatus },
}

/// Subscriber set over a broadcast channel.
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Create a notifier with the given per-subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Emit a notification to every subscriber. A send with no subscribers
    /// is not an error.
    pub fn emit(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fan_out_reaches_all_subscribers() {
        let notifier = Notifier::new(8);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.emit(Notification::TaskStatusChanged {
            task_id: TaskId::new("t1"),
            status: TaskStatus::Completed,
        });

        for rx in [&mut a, &mut b] {
            match rx.recv().await.unwrap() {
                Notification::TaskStatusChanged { task_id, status } => {
                    assert_eq!(task_id.as_str(), "t1");
                    assert_eq!(status, TaskStatus::Completed);
                }
                other => panic!("unexpected notification: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_fine() {
        let notifier = Notifier::new(8);
        notifier.emit(Notification::TaskStatusChanged {
            task_id: TaskId::new("t1"),
            status: TaskStatus::Failed,
        });
    }

    #[tokio::test]
    async fn per_worker_order_follows_emission() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();

        for status in [WorkerStatus::Online, WorkerStatus::Working, WorkerStatus::Idle] {
            notifier.emit(Notification::WorkerStatusChanged {
                worker_id: WorkerId::new("alpha"),
                name: "alpha".to_string(),
                status,
                current_context: None,
            });
        }

        let mut seen = Vec::new();
        for _ in 0..3 {
            if let Notification::WorkerStatusChanged { status, .. } = rx.recv().await.unwrap() {
                seen.push(status);
            }
        }
        assert_eq!(
            seen,
            vec![WorkerStatus::Online, WorkerStatus::Working, WorkerStatus::Idle]
        );
    }
}
