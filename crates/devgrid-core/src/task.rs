//! Task types.

use crate::{CoreError, ProjectId, TaskId, TaskStatus, WorkerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied fields for creating a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Short human-readable title.
    pub title: String,

    /// Full description handed to the executor.
    pub description: String,

    /// Opaque task-type tag (e.g. "feature", "bugfix").
    pub task_type: String,

    /// Working-directory hint for the executor.
    pub work_dir: Option<String>,
}

impl TaskDraft {
    /// Create a draft with the given title and description.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            task_type: "feature".to_string(),
            work_dir: None,
        }
    }

    /// Builder method to set the task type.
    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Builder method to set the working-directory hint.
    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }
}

/// A Task targets exactly one worker within one project. Its existence is
/// independent of whether it was ever delivered: persistence is guaranteed,
/// delivery is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, controller-generated.
    pub id: TaskId,

    /// The worker this task targets.
    pub worker_id: WorkerId,

    /// The project whose context the task runs against.
    pub project_id: ProjectId,

    /// Short human-readable title.
    pub title: String,

    /// Full description handed to the executor.
    pub description: String,

    /// Opaque task-type tag.
    pub task_type: String,

    /// Working-directory hint for the executor.
    pub work_dir: Option<String>,

    /// Current task status.
    pub status: TaskStatus,

    /// Result text reported on completion.
    pub result: Option<String>,

    /// Error text reported on failure.
    pub error: Option<String>,

    /// When the task was created.
    pub created_at: DateTime<Utc>,

    /// When the payload was pushed to a live channel, if ever.
    pub dispatched_at: Option<DateTime<Utc>>,

    /// When a terminal status was reported, if ever.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task from a draft.
    pub fn new(worker_id: WorkerId, project_id: ProjectId, draft: TaskDraft) -> Self {
        Self {
            id: TaskId::generate(),
            worker_id,
            project_id,
            title: draft.title,
            description: draft.description,
            task_type: draft.task_type,
            work_dir: draft.work_dir,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            dispatched_at: None,
            finished_at: None,
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Mark the payload as pushed onto a live channel.
    pub fn mark_dispatched(&mut self) {
        self.status = TaskStatus::Dispatched;
        self.dispatched_at = Some(Utc::now());
    }

    /// Mark the task completed with the worker-reported result.
    pub fn complete(&mut self, result: Option<String>) {
        self.status = TaskStatus::Completed;
        self.result = result;
        self.finished_at = Some(Utc::now());
    }

    /// Mark the task failed with the worker-reported error.
    pub fn fail(&mut self, error: Option<String>) {
        self.status = TaskStatus::Failed;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a worker-reported status.
    ///
    /// Reports move the task forward only: Dispatched applies to a Pending
    /// task, a terminal status to any non-terminal task. Everything else is
    /// rejected, so a stale or replayed report can never regress a terminal
    /// outcome.
    pub fn apply_report(
        &mut self,
        status: TaskStatus,
        result: Option<String>,
        error: Option<String>,
    ) -> Result<(), CoreError> {
        let invalid = || CoreError::InvalidStateTransition {
            from: format!("{:?}", self.status),
            to: format!("{status:?}"),
        };

        match status {
            TaskStatus::Pending => Err(CoreError::InvalidInput(
                "a task cannot be reported back to Pending".to_string(),
            )),
            TaskStatus::Dispatched => {
                if self.status == TaskStatus::Pending {
                    self.mark_dispatched();
                    Ok(())
                } else {
                    Err(invalid())
                }
            }
            TaskStatus::Completed => {
                if self.is_terminal() {
                    Err(invalid())
                } else {
                    self.complete(result);
                    Ok(())
                }
            }
            TaskStatus::Failed => {
                if self.is_terminal() {
                    Err(invalid())
                } else {
                    self.fail(error);
                    Ok(())
                }
            }
        }
    }
}
