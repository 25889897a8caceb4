//! Converters between proto types and domain types.

use crate::pb;
use devgrid_core::{
    EntryId, EntryKind, SessionId, SessionStatus, Task, TaskId, TaskStatus, TraceEntry,
    TraceSession, WorkerDescriptor, WorkerId, WorkerStatus,
};

// ============================================================================
// WorkerStatus conversions
// ============================================================================

impl From<WorkerStatus> for pb::WorkerStatus {
    fn from(status: WorkerStatus) -> Self {
        match status {
            WorkerStatus::Online => pb::WorkerStatus::Online,
            WorkerStatus::Idle => pb::WorkerStatus::Idle,
            WorkerStatus::Working => pb::WorkerStatus::Working,
            WorkerStatus::Offline => pb::WorkerStatus::Offline,
        }
    }
}

impl From<pb::WorkerStatus> for WorkerStatus {
    fn from(status: pb::WorkerStatus) -> Self {
        match status {
            pb::WorkerStatus::Unspecified => WorkerStatus::Offline,
            pb::WorkerStatus::Online => WorkerStatus::Online,
            pb::WorkerStatus::Idle => WorkerStatus::Idle,
            pb::WorkerStatus::Working => WorkerStatus::Working,
            pb::WorkerStatus::Offline => WorkerStatus::Offline,
        }
    }
}

// ============================================================================
// TaskStatus conversions
// ============================================================================

impl From<TaskStatus> for pb::TaskStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => pb::TaskStatus::Pending,
            TaskStatus::Dispatched => pb::TaskStatus::Dispatched,
            TaskStatus::Completed => pb::TaskStatus::Completed,
            TaskStatus::Failed => pb::TaskStatus::Failed,
        }
    }
}

impl From<pb::TaskStatus> for TaskStatus {
    fn from(status: pb::TaskStatus) -> Self {
        match status {
            pb::TaskStatus::Unspecified => TaskStatus::Pending,
            pb::TaskStatus::Pending => TaskStatus::Pending,
            pb::TaskStatus::Dispatched => TaskStatus::Dispatched,
            pb::TaskStatus::Completed => TaskStatus::Completed,
            pb::TaskStatus::Failed => TaskStatus::Failed,
        }
    }
}

// ============================================================================
// SessionStatus conversions
// ============================================================================

impl From<SessionStatus> for pb::SessionStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Running => pb::SessionStatus::Running,
            SessionStatus::Completed => pb::SessionStatus::Completed,
            SessionStatus::Failed => pb::SessionStatus::Failed,
        }
    }
}

impl From<pb::SessionStatus> for SessionStatus {
    fn from(status: pb::SessionStatus) -> Self {
        match status {
            pb::SessionStatus::Unspecified => SessionStatus::Running,
            pb::SessionStatus::Running => SessionStatus::Running,
            pb::SessionStatus::Completed => SessionStatus::Completed,
            pb::SessionStatus::Failed => SessionStatus::Failed,
        }
    }
}

// ============================================================================
// EntryKind conversions
// ============================================================================

impl From<EntryKind> for pb::EntryKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::TaskReceived => pb::EntryKind::TaskReceived,
            EntryKind::Thinking => pb::EntryKind::Thinking,
            EntryKind::Discussion => pb::EntryKind::Discussion,
            EntryKind::Step => pb::EntryKind::Step,
            EntryKind::Result => pb::EntryKind::Result,
            EntryKind::Error => pb::EntryKind::Error,
        }
    }
}

impl From<pb::EntryKind> for EntryKind {
    fn from(kind: pb::EntryKind) -> Self {
        match kind {
            pb::EntryKind::Unspecified => EntryKind::Step,
            pb::EntryKind::TaskReceived => EntryKind::TaskReceived,
            pb::EntryKind::Thinking => EntryKind::Thinking,
            pb::EntryKind::Discussion => EntryKind::Discussion,
            pb::EntryKind::Step => EntryKind::Step,
            pb::EntryKind::Result => EntryKind::Result,
            pb::EntryKind::Error => EntryKind::Error,
        }
    }
}

// ============================================================================
// WorkerDescriptor conversions
// ============================================================================

impl From<WorkerDescriptor> for pb::Register {
    fn from(descriptor: WorkerDescriptor) -> Self {
        pb::Register {
            name: descriptor.name,
            worker_type: descriptor.worker_type,
            os: descriptor.os,
            address: descriptor.address,
            metadata: descriptor.metadata,
        }
    }
}

impl From<pb::Register> for WorkerDescriptor {
    fn from(proto: pb::Register) -> Self {
        WorkerDescriptor {
            name: proto.name,
            worker_type: proto.worker_type,
            os: proto.os,
            address: proto.address,
            metadata: proto.metadata,
        }
    }
}

// ============================================================================
// TraceSession conversions
// ============================================================================

impl From<TraceSession> for pb::TraceSessionRecord {
    fn from(session: TraceSession) -> Self {
        pb::TraceSessionRecord {
            id: session.id.into_inner(),
            task_id: session.task_id.into_inner(),
            worker_id: session.worker_id.into_inner(),
            status: pb::SessionStatus::from(session.status) as i32,
            started_at_ms: session.started_at_ms,
            ended_at_ms: session.ended_at_ms,
        }
    }
}

impl From<pb::TraceSessionRecord> for TraceSession {
    fn from(proto: pb::TraceSessionRecord) -> Self {
        let status = pb::SessionStatus::try_from(proto.status)
            .unwrap_or(pb::SessionStatus::Unspecified)
            .into();
        TraceSession {
            id: SessionId::new(proto.id),
            task_id: TaskId::new(proto.task_id),
            worker_id: WorkerId::new(proto.worker_id),
            status,
            started_at_ms: proto.started_at_ms,
            ended_at_ms: proto.ended_at_ms,
        }
    }
}

// ============================================================================
// TraceEntry conversions
// ============================================================================

impl From<TraceEntry> for pb::TraceEntryRecord {
    fn from(entry: TraceEntry) -> Self {
        pb::TraceEntryRecord {
            id: entry.id.into_inner(),
            session_id: entry.session_id.into_inner(),
            kind: pb::EntryKind::from(entry.kind) as i32,
            title: entry.title,
            content: entry.content,
            metadata: entry.metadata,
            duration_ms: entry.duration_ms,
            timestamp_ms: entry.timestamp_ms,
        }
    }
}

impl From<pb::TraceEntryRecord> for TraceEntry {
    fn from(proto: pb::TraceEntryRecord) -> Self {
        let kind = pb::EntryKind::try_from(proto.kind)
            .unwrap_or(pb::EntryKind::Unspecified)
            .into();
        TraceEntry {
            id: EntryId::new(proto.id),
            session_id: SessionId::new(proto.session_id),
            kind,
            title: proto.title,
            content: proto.content,
            metadata: proto.metadata,
            duration_ms: proto.duration_ms,
            timestamp_ms: proto.timestamp_ms,
        }
    }
}

// ============================================================================
// Task -> TaskAssigned (dispatch payload)
// ============================================================================

impl From<&Task> for pb::TaskAssigned {
    fn from(task: &Task) -> Self {
        pb::TaskAssigned {
            task_id: task.id.as_str().to_string(),
            worker_id: task.worker_id.as_str().to_string(),
            project_id: task.project_id.as_str().to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            task_type: task.task_type.clone(),
            work_dir: task.work_dir.clone(),
        }
    }
}
