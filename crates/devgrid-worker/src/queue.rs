//! Local task queue.
//!
//! Assignments arriving over the channel are queued here and executed one
//! at a time. Duplicate assignments (redelivery after a reconnect, or a
//! broadcast frame seen twice) are dropped by task id. A failing task
//! reports its terminal state and the loop moves on.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::Notify;
use tracing::{info, warn};

use devgrid_core::{SessionStatus, TaskStatus, TraceEntry, WorkerId};
use devgrid_proto::pb::worker_frame::Payload as WorkerPayload;
use devgrid_proto::pb::{TaskAssigned, WorkerFrame};

use crate::connection::{status_frame, task_status_frame, Outbound};
use crate::executor::TaskExecutor;
use crate::tracelog::{PendingReport, TraceLog, TraceRecorder};

#[derive(Default)]
struct Inner {
    queue: VecDeque<TaskAssigned>,
    seen: HashSet<String>,
    active: Option<String>,
}

/// FIFO queue with per-task-id dedup and single-task concurrency.
#[derive(Default)]
pub struct TaskQueue {
    inner: StdMutex<Inner>,
    notify: Notify,
}

impl TaskQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue an assignment. Returns false for a task id seen before.
    pub fn enqueue(&self, assignment: TaskAssigned) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if !inner.seen.insert(assignment.task_id.clone()) {
            info!(task_id = %assignment.task_id, "Dropping duplicate assignment");
            return false;
        }
        inner.queue.push_back(assignment);
        drop(inner);
        self.notify.notify_one();
        true
    }

    /// Number of assignments waiting (excludes the active one).
    pub fn depth(&self) -> usize {
        self.inner.lock().map(|inner| inner.queue.len()).unwrap_or(0)
    }

    async fn next(&self) -> TaskAssigned {
        loop {
            if let Ok(mut inner) = self.inner.lock() {
                if let Some(assignment) = inner.queue.pop_front() {
                    inner.active = Some(assignment.task_id.clone());
                    return assignment;
                }
            }
            self.notify.notified().await;
        }
    }

    fn finish(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.active = None;
        }
    }
}

/// Shared handles the run loop needs for reporting and tracing.
pub struct QueueContext {
    pub outbound: Arc<Outbound>,
    pub log: Arc<TraceLog>,
}

/// Drain the queue forever, one task at a time.
pub async fn run(queue: Arc<TaskQueue>, executor: Arc<dyn TaskExecutor>, ctx: QueueContext) {
    loop {
        let assignment = queue.next().await;
        process_one(executor.as_ref(), &ctx, assignment).await;
        queue.finish();
    }
}

async fn process_one(executor: &dyn TaskExecutor, ctx: &QueueContext, assignment: TaskAssigned) {
    let worker_id = WorkerId::new(assignment.worker_id.clone());
    let task_id = assignment.task_id.clone();
    info!(task_id = %task_id, title = %assignment.title, "Starting task");

    ctx.outbound.try_send(status_frame(
        &worker_id,
        devgrid_core::WorkerStatus::Working,
        Some(assignment.title.clone()),
    ));
    ctx.outbound
        .try_send(task_status_frame(&task_id, TaskStatus::Dispatched, None, None));

    let opened = {
        let log = ctx.log.clone();
        let task = devgrid_core::TaskId::new(task_id.clone());
        let worker = worker_id.clone();
        tokio::task::spawn_blocking(move || log.create_session(task, worker)).await
    };
    let session = match opened {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            warn!(task_id = %task_id, error = %e, "Failed to open trace session");
            report_terminal(ctx, &worker_id, &task_id, Err(format!("trace log error: {e}"))).await;
            return;
        }
        Err(e) => {
            warn!(task_id = %task_id, error = %e, "Trace session task failed");
            report_terminal(ctx, &worker_id, &task_id, Err(format!("trace log error: {e}"))).await;
            return;
        }
    };

    ctx.outbound.try_send(WorkerFrame {
        payload: Some(WorkerPayload::TraceSession(session.clone().into())),
    });

    let recorder = TraceRecorder::new(ctx.log.clone(), ctx.outbound.clone(), session.id.clone());
    recorder
        .record(TraceEntry::task_received(
            session.id.clone(),
            &assignment.title,
        ))
        .await;

    let outcome = executor.execute(&assignment, &recorder).await;

    let session_status = if outcome.is_ok() {
        SessionStatus::Completed
    } else {
        SessionStatus::Failed
    };
    let closed = {
        let log = ctx.log.clone();
        let id = session.id.clone();
        tokio::task::spawn_blocking(move || log.close_session(&id, session_status)).await
    };
    match closed {
        Ok(Ok(Some(session))) => {
            ctx.outbound.try_send(WorkerFrame {
                payload: Some(WorkerPayload::TraceSession(session.into())),
            });
        }
        Ok(Ok(None)) => {}
        Ok(Err(e)) => warn!(task_id = %task_id, error = %e, "Failed to close trace session"),
        Err(e) => warn!(task_id = %task_id, error = %e, "Trace close task failed"),
    }

    match outcome {
        Ok(result) => {
            info!(task_id = %task_id, "Task completed");
            report_terminal(ctx, &worker_id, &task_id, Ok(result)).await;
        }
        Err(e) => {
            warn!(task_id = %task_id, error = %e, "Task failed");
            report_terminal(ctx, &worker_id, &task_id, Err(e.to_string())).await;
        }
    }
}

async fn report_terminal(
    ctx: &QueueContext,
    worker_id: &WorkerId,
    task_id: &str,
    outcome: Result<String, String>,
) {
    let report = match outcome {
        Ok(result) => PendingReport {
            task_id: devgrid_core::TaskId::new(task_id),
            status: TaskStatus::Completed,
            result: Some(result),
            error: None,
        },
        Err(error) => PendingReport {
            task_id: devgrid_core::TaskId::new(task_id),
            status: TaskStatus::Failed,
            result: None,
            error: Some(error),
        },
    };

    // Durable first. If the send below is dropped or the channel is down,
    // the report replays from the log on the next connection.
    let persisted = {
        let log = ctx.log.clone();
        let stored = report.clone();
        tokio::task::spawn_blocking(move || log.record_report(&stored)).await
    };
    match persisted {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(task_id = %task_id, error = %e, "Failed to persist task report"),
        Err(e) => warn!(task_id = %task_id, error = %e, "Report persist task failed"),
    }

    ctx.outbound.try_send(task_status_frame(
        report.task_id.as_str(),
        report.status,
        report.result,
        report.error,
    ));
    ctx.outbound.try_send(status_frame(
        worker_id,
        devgrid_core::WorkerStatus::Idle,
        None,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Scripted {
        outcomes: StdMutex<VecDeque<Result<String, String>>>,
        running: AtomicUsize,
        max_running: AtomicUsize,
        delay: Duration,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String, String>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: StdMutex::new(outcomes.into()),
                running: AtomicUsize::new(0),
                max_running: AtomicUsize::new(0),
                delay: Duration::from_millis(20),
            })
        }
    }

    #[async_trait]
    impl TaskExecutor for Scripted {
        async fn execute(
            &self,
            _assignment: &TaskAssigned,
            _recorder: &TraceRecorder,
        ) -> Result<String, ExecutorError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok("done".to_string()));
            outcome.map_err(|stderr| ExecutorError::NonZeroExit { code: 1, stderr })
        }
    }

    fn assignment(task_id: &str) -> TaskAssigned {
        TaskAssigned {
            task_id: task_id.to_string(),
            worker_id: "w-1".to_string(),
            project_id: "p-1".to_string(),
            title: format!("task {task_id}"),
            description: "do the thing".to_string(),
            task_type: "feature".to_string(),
            work_dir: None,
        }
    }

    fn context() -> (QueueContext, mpsc::Receiver<WorkerFrame>) {
        let outbound = Outbound::new();
        let (tx, rx) = mpsc::channel(64);
        outbound.bind_for_test(tx);
        let log = Arc::new(TraceLog::open(None).unwrap());
        (QueueContext { outbound, log }, rx)
    }

    async fn terminal_reports(rx: &mut mpsc::Receiver<WorkerFrame>, expected: usize) -> Vec<(String, i32)> {
        let mut reports = Vec::new();
        while reports.len() < expected {
            let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for frames")
                .expect("channel closed");
            if let Some(WorkerPayload::TaskStatus(report)) = frame.payload {
                let status = devgrid_core::TaskStatus::from(
                    devgrid_proto::pb::TaskStatus::try_from(report.status)
                        .unwrap_or(devgrid_proto::pb::TaskStatus::Unspecified),
                );
                if status.is_terminal() {
                    reports.push((report.task_id, report.status));
                }
            }
        }
        reports
    }

    #[tokio::test]
    async fn tasks_run_one_at_a_time() {
        let (ctx, mut rx) = context();
        let queue = TaskQueue::new();
        let executor = Scripted::new(vec![Ok("a".into()), Ok("b".into()), Ok("c".into())]);

        tokio::spawn(run(queue.clone(), executor.clone(), ctx));
        for i in 0..3 {
            assert!(queue.enqueue(assignment(&format!("t{i}"))));
        }

        let reports = terminal_reports(&mut rx, 3).await;
        assert_eq!(reports.len(), 3);
        assert_eq!(executor.max_running.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_reports_and_does_not_block_the_queue() {
        let (ctx, mut rx) = context();
        let queue = TaskQueue::new();
        let executor = Scripted::new(vec![Err("boom".into()), Ok("fine".into())]);

        tokio::spawn(run(queue.clone(), executor, ctx));
        queue.enqueue(assignment("t1"));
        queue.enqueue(assignment("t2"));

        let reports = terminal_reports(&mut rx, 2).await;
        assert_eq!(
            reports[0],
            (
                "t1".to_string(),
                devgrid_proto::pb::TaskStatus::Failed as i32
            )
        );
        assert_eq!(
            reports[1],
            (
                "t2".to_string(),
                devgrid_proto::pb::TaskStatus::Completed as i32
            )
        );
    }

    #[tokio::test]
    async fn duplicate_assignments_are_dropped() {
        let (ctx, mut rx) = context();
        let queue = TaskQueue::new();
        assert!(queue.enqueue(assignment("t1")));
        assert!(!queue.enqueue(assignment("t1")));
        assert_eq!(queue.depth(), 1);

        let executor = Scripted::new(vec![Ok("once".into())]);
        tokio::spawn(run(queue.clone(), executor, ctx));

        let reports = terminal_reports(&mut rx, 1).await;
        assert_eq!(reports[0].0, "t1");
        // Nothing else queued: the duplicate never executed.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.depth(), 0);
        let mut extra = 0;
        while let Ok(frame) = rx.try_recv() {
            if let Some(WorkerPayload::TaskStatus(report)) = frame.payload {
                if devgrid_core::TaskStatus::from(
                    devgrid_proto::pb::TaskStatus::try_from(report.status)
                        .unwrap_or(devgrid_proto::pb::TaskStatus::Unspecified),
                )
                .is_terminal()
                {
                    extra += 1;
                }
            }
        }
        assert_eq!(extra, 0);
    }

    #[tokio::test]
    async fn terminal_report_is_persisted_even_while_disconnected() {
        // No channel bound: every outbound frame is dropped on the floor.
        let outbound = Outbound::new();
        let log = Arc::new(TraceLog::open(None).unwrap());
        let ctx = QueueContext {
            outbound,
            log: log.clone(),
        };

        let queue = TaskQueue::new();
        let executor = Scripted::new(vec![Ok("done".into())]);
        tokio::spawn(run(queue.clone(), executor, ctx));
        queue.enqueue(assignment("t1"));

        for _ in 0..200 {
            if !log.unsynced_reports().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let reports = log.unsynced_reports().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].task_id.as_str(), "t1");
        assert_eq!(reports[0].status, TaskStatus::Completed);
        assert_eq!(reports[0].result.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn queue_depth_drops_as_tasks_drain() {
        let (ctx, mut rx) = context();
        let queue = TaskQueue::new();
        queue.enqueue(assignment("t1"));
        queue.enqueue(assignment("t2"));
        assert_eq!(queue.depth(), 2);

        let executor = Scripted::new(vec![Ok("a".into()), Ok("b".into())]);
        tokio::spawn(run(queue.clone(), executor, ctx));

        terminal_reports(&mut rx, 2).await;
        assert_eq!(queue.depth(), 0);
    }
}
