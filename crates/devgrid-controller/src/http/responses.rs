//! HTTP request and response types.

use serde::{Deserialize, Serialize};

use devgrid_core::{Project, Task, TraceEntry, TraceSession, WorkerRecord};

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Worker types
// ============================================================================

/// Response for a single worker.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub worker_id: String,
    pub name: String,
    pub worker_type: String,
    pub os: String,
    pub address: String,
    pub role: String,
    pub capabilities: Vec<String>,
    pub status: String,
    pub current_context: Option<String>,
    pub last_seen_at: String,
    pub connected: bool,
    pub registered_at: String,
}

impl WorkerResponse {
    pub fn from_record(record: WorkerRecord, connected: bool) -> Self {
        Self {
            worker_id: record.id.into_inner(),
            name: record.name,
            worker_type: record.worker_type,
            os: record.os,
            address: record.address,
            role: record.role,
            capabilities: record.capabilities,
            status: format!("{:?}", record.status).to_uppercase(),
            current_context: record.current_context,
            last_seen_at: record.last_seen_at.to_rfc3339(),
            connected,
            registered_at: record.registered_at.to_rfc3339(),
        }
    }
}

/// Request body for updating a worker's assignment.
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateWorkerRequest {
    pub role: Option<String>,
    pub capabilities: Option<Vec<String>>,
}

// ============================================================================
// Project types
// ============================================================================

/// Request body for creating a project.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub root_path: String,
}

/// Response for a single project.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub project_id: String,
    pub name: String,
    pub root_path: String,
    pub created_at: String,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            project_id: project.id.into_inner(),
            name: project.name,
            root_path: project.root_path,
            created_at: project.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Task types
// ============================================================================

/// Request body for creating a task.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateTaskRequest {
    pub worker_id: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub work_dir: Option<String>,
}

/// Response for a single task.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub worker_id: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub work_dir: Option<String>,
    pub status: String,
    pub result: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
    pub dispatched_at: Option<String>,
    pub finished_at: Option<String>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.id.into_inner(),
            worker_id: task.worker_id.into_inner(),
            project_id: task.project_id.into_inner(),
            title: task.title,
            description: task.description,
            task_type: task.task_type,
            work_dir: task.work_dir,
            status: format!("{:?}", task.status).to_uppercase(),
            result: task.result,
            error: task.error,
            created_at: task.created_at.to_rfc3339(),
            dispatched_at: task.dispatched_at.map(|t| t.to_rfc3339()),
            finished_at: task.finished_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response for task creation: the persisted task plus the delivery outcome,
/// so the caller can tell "delivered" from "queued, will deliver on
/// reconnect".
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub task: TaskResponse,
    pub dispatched: bool,
}

// ============================================================================
// Trace types
// ============================================================================

/// Response for a single trace session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub task_id: String,
    pub worker_id: String,
    pub status: String,
    pub started_at_ms: i64,
    pub ended_at_ms: Option<i64>,
}

impl From<TraceSession> for SessionResponse {
    fn from(session: TraceSession) -> Self {
        Self {
            session_id: session.id.into_inner(),
            task_id: session.task_id.into_inner(),
            worker_id: session.worker_id.into_inner(),
            status: format!("{:?}", session.status).to_uppercase(),
            started_at_ms: session.started_at_ms,
            ended_at_ms: session.ended_at_ms,
        }
    }
}

/// Response for a single trace entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub entry_id: String,
    pub session_id: String,
    pub kind: String,
    pub title: String,
    pub content: String,
    pub metadata: std::collections::HashMap<String, String>,
    pub duration_ms: Option<i64>,
    pub timestamp_ms: i64,
}

impl From<TraceEntry> for EntryResponse {
    fn from(entry: TraceEntry) -> Self {
        Self {
            entry_id: entry.id.into_inner(),
            session_id: entry.session_id.into_inner(),
            kind: format!("{:?}", entry.kind).to_lowercase(),
            title: entry.title,
            content: entry.content,
            metadata: entry.metadata,
            duration_ms: entry.duration_ms,
            timestamp_ms: entry.timestamp_ms,
        }
    }
}
