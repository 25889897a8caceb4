//! Status enums for Workers, Tasks, and TraceSessions.

use serde::{Deserialize, Serialize};

/// Liveness/activity status of a Worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    /// Worker has a live channel but has not reported activity yet.
    Online,
    /// Worker is connected and not executing a task.
    Idle,
    /// Worker is executing a task.
    Working,
    /// Worker has no live channel (clean close or liveness timeout).
    #[default]
    Offline,
}

impl WorkerStatus {
    /// Returns true if the worker is reachable in any form.
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Offline)
    }
}

/// Status of a Task in the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task persisted but not yet delivered to its worker.
    #[default]
    Pending,
    /// Task payload was pushed onto the worker's live channel.
    Dispatched,
    /// Worker reported successful completion.
    Completed,
    /// Worker reported failure.
    Failed,
}

impl TaskStatus {
    /// Returns true if the task reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the task is still in flight (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Status of a TraceSession.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Execution in progress.
    #[default]
    Running,
    /// Execution finished successfully.
    Completed,
    /// Execution finished with an error.
    Failed,
}

impl SessionStatus {
    /// Returns true if the session is closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Kind of a TraceEntry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Worker acknowledged receipt of the task.
    #[default]
    TaskReceived,
    /// Internal reasoning emitted by the executor.
    Thinking,
    /// Conversational output from the executor.
    Discussion,
    /// A discrete execution step.
    Step,
    /// Final result of the execution.
    Result,
    /// An error surfaced during execution.
    Error,
}
