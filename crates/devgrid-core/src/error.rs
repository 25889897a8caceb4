//! Core domain errors.

use thiserror::Error;

/// Core domain errors for DevGrid.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Worker not found.
    #[error("Worker not found: {0}")]
    WorkerNotFound(String),

    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Project not found.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Trace session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
