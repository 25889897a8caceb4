//! Execution telemetry: trace sessions and entries.
//!
//! Both record types carry *producer-assigned* ids (the worker generates
//! them, never the controller) so that replaying a sync after a dropped
//! acknowledgment collapses into an idempotent upsert.

use crate::ids::{EntryId, SessionId, TaskId, WorkerId};
use crate::status::{EntryKind, SessionStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// One execution of a task on a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSession {
    /// Unique session identifier (producer-assigned).
    pub id: SessionId,
    /// Task this session executes.
    pub task_id: TaskId,
    /// Worker executing the task.
    pub worker_id: WorkerId,
    /// Current session status.
    pub status: SessionStatus,
    /// Unix timestamp (milliseconds) when execution began.
    pub started_at_ms: i64,
    /// Unix timestamp (milliseconds) when execution ended, if it has.
    pub ended_at_ms: Option<i64>,
}

impl TraceSession {
    /// Open a new running session.
    pub fn open(task_id: TaskId, worker_id: WorkerId) -> Self {
        Self {
            id: SessionId::generate(),
            task_id,
            worker_id,
            status: SessionStatus::Running,
            started_at_ms: now_ms(),
            ended_at_ms: None,
        }
    }

    /// Close the session with a terminal status.
    pub fn close(&mut self, status: SessionStatus) {
        self.status = status;
        self.ended_at_ms = Some(now_ms());
    }
}

/// One immutable telemetry record within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Unique entry identifier (producer-assigned).
    pub id: EntryId,
    /// Session this entry belongs to.
    pub session_id: SessionId,
    /// Kind of entry.
    pub kind: EntryKind,
    /// Short title.
    pub title: String,
    /// Entry body.
    pub content: String,
    /// Entry-specific metadata (exit_code, command, ...).
    pub metadata: HashMap<String, String>,
    /// Duration of the step in milliseconds, if measured.
    pub duration_ms: Option<i64>,
    /// Unix timestamp (milliseconds) when the entry was written.
    pub timestamp_ms: i64,
}

impl TraceEntry {
    /// Create a new entry.
    pub fn new(
        session_id: SessionId,
        kind: EntryKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            session_id,
            kind,
            title: title.into(),
            content: content.into(),
            metadata: HashMap::new(),
            duration_ms: None,
            timestamp_ms: now_ms(),
        }
    }

    /// Create a TaskReceived entry.
    pub fn task_received(session_id: SessionId, task_title: &str) -> Self {
        Self::new(
            session_id,
            EntryKind::TaskReceived,
            "Task received",
            task_title,
        )
    }

    /// Create a Step entry.
    pub fn step(session_id: SessionId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, EntryKind::Step, title, content)
    }

    /// Create a Result entry with the measured duration.
    pub fn result(
        session_id: SessionId,
        content: impl Into<String>,
        duration_ms: Option<i64>,
    ) -> Self {
        let mut entry = Self::new(session_id, EntryKind::Result, "Result", content);
        entry.duration_ms = duration_ms;
        entry
    }

    /// Create an Error entry.
    pub fn error(session_id: SessionId, error: impl Into<String>) -> Self {
        Self::new(session_id, EntryKind::Error, "Error", error)
    }

    /// Builder method to add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Builder method to set the duration.
    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}
