//! Record storage boundary.
//!
//! The controller persists workers, tasks, projects and trace records behind
//! the [`RecordStore`] trait. Every write is an upsert or single-record
//! update keyed by a stable id, so contention is per-id. [`MemoryStore`] is
//! the in-process implementation; a durable or multi-instance deployment
//! would reimplement this trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use devgrid_core::{
    EntryId, Project, ProjectId, SessionId, Task, TaskId, TaskStatus, TraceEntry, TraceSession,
    WorkerId, WorkerRecord,
};

/// In-place record mutation, applied under the store's write lock. The
/// returned bool is caller-defined (typically "the change is worth
/// announcing") and is handed back alongside the updated record.
pub type WorkerUpdate = Box<dyn FnOnce(&mut WorkerRecord) -> bool + Send>;
/// In-place task mutation, applied under the store's write lock.
pub type TaskUpdate = Box<dyn FnOnce(&mut Task) -> bool + Send>;

/// Storage boundary for all controller-side records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Upsert a worker record keyed by id.
    async fn upsert_worker(&self, record: WorkerRecord);
    /// Look up a worker by id.
    async fn worker(&self, id: &WorkerId) -> Option<WorkerRecord>;
    /// Look up a worker by its stable name (the registration upsert key).
    async fn worker_by_name(&self, name: &str) -> Option<WorkerRecord>;
    /// All known workers.
    async fn workers(&self) -> Vec<WorkerRecord>;
    /// Mutate a worker in place, serialized against every other update to
    /// the same map. Returns the updated record plus the closure's flag, or
    /// None for an unknown id.
    async fn update_worker(
        &self,
        id: &WorkerId,
        f: WorkerUpdate,
    ) -> Option<(WorkerRecord, bool)>;

    /// Upsert a task keyed by id.
    async fn upsert_task(&self, task: Task);
    /// Mutate a task in place, serialized against every other update to the
    /// same map. Returns the updated task plus the closure's flag, or None
    /// for an unknown id.
    async fn update_task(&self, id: &TaskId, f: TaskUpdate) -> Option<(Task, bool)>;
    /// Look up a task by id.
    async fn task(&self, id: &TaskId) -> Option<Task>;
    /// All tasks, newest first.
    async fn tasks(&self) -> Vec<Task>;
    /// Pending tasks targeted at the given worker, oldest first.
    async fn pending_tasks_for(&self, worker_id: &WorkerId) -> Vec<Task>;

    /// Upsert a project keyed by id.
    async fn upsert_project(&self, project: Project);
    /// Look up a project by id.
    async fn project(&self, id: &ProjectId) -> Option<Project>;
    /// All projects.
    async fn projects(&self) -> Vec<Project>;

    /// Idempotent upsert of a trace session keyed by its producer-assigned
    /// id. A repeat of the same id replaces the record, never duplicates it.
    async fn upsert_session(&self, session: TraceSession);
    /// Look up a session by id.
    async fn session(&self, id: &SessionId) -> Option<TraceSession>;
    /// Sessions recorded for a task, in start order.
    async fn sessions_for_task(&self, task_id: &TaskId) -> Vec<TraceSession>;

    /// Idempotent upsert of a trace entry keyed by its producer-assigned id.
    async fn upsert_entry(&self, entry: TraceEntry);
    /// Entries of a session in append (timestamp) order.
    async fn entries_for_session(&self, session_id: &SessionId) -> Vec<TraceEntry>;
}

/// In-process store over per-entity maps.
#[derive(Default)]
pub struct MemoryStore {
    workers: RwLock<HashMap<WorkerId, WorkerRecord>>,
    tasks: RwLock<HashMap<TaskId, Task>>,
    projects: RwLock<HashMap<ProjectId, Project>>,
    sessions: RwLock<HashMap<SessionId, TraceSession>>,
    entries: RwLock<HashMap<EntryId, TraceEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert_worker(&self, record: WorkerRecord) {
        self.workers.write().await.insert(record.id.clone(), record);
    }

    async fn worker(&self, id: &WorkerId) -> Option<WorkerRecord> {
        self.workers.read().await.get(id).cloned()
    }

    async fn worker_by_name(&self, name: &str) -> Option<WorkerRecord> {
        self.workers
            .read()
            .await
            .values()
            .find(|w| w.name == name)
            .cloned()
    }

    async fn workers(&self) -> Vec<WorkerRecord> {
        let mut workers: Vec<_> = self.workers.read().await.values().cloned().collect();
        workers.sort_by(|a, b| a.name.cmp(&b.name));
        workers
    }

    async fn update_worker(
        &self,
        id: &WorkerId,
        f: WorkerUpdate,
    ) -> Option<(WorkerRecord, bool)> {
        let mut workers = self.workers.write().await;
        let record = workers.get_mut(id)?;
        let flag = f(record);
        Some((record.clone(), flag))
    }

    async fn upsert_task(&self, task: Task) {
        self.tasks.write().await.insert(task.id.clone(), task);
    }

    async fn update_task(&self, id: &TaskId, f: TaskUpdate) -> Option<(Task, bool)> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id)?;
        let flag = f(task);
        Some((task.clone(), flag))
    }

    async fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    async fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<_> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    async fn pending_tasks_for(&self, worker_id: &WorkerId) -> Vec<Task> {
        let mut tasks: Vec<_> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.status == TaskStatus::Pending && &t.worker_id == worker_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tasks
    }

    async fn upsert_project(&self, project: Project) {
        self.projects
            .write()
            .await
            .insert(project.id.clone(), project);
    }

    async fn project(&self, id: &ProjectId) -> Option<Project> {
        self.projects.read().await.get(id).cloned()
    }

    async fn projects(&self) -> Vec<Project> {
        let mut projects: Vec<_> = self.projects.read().await.values().cloned().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        projects
    }

    async fn upsert_session(&self, session: TraceSession) {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
    }

    async fn session(&self, id: &SessionId) -> Option<TraceSession> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn sessions_for_task(&self, task_id: &TaskId) -> Vec<TraceSession> {
        let mut sessions: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| &s.task_id == task_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at_ms);
        sessions
    }

    async fn upsert_entry(&self, entry: TraceEntry) {
        self.entries.write().await.insert(entry.id.clone(), entry);
    }

    async fn entries_for_session(&self, session_id: &SessionId) -> Vec<TraceEntry> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| &e.session_id == session_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.timestamp_ms
                .cmp(&b.timestamp_ms)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        entries
    }
}
