//! DevGrid Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/gRPC
//! - Database
//! - Runtime specifics
//!
//! All types here represent the core business domain of DevGrid.

pub mod error;
pub mod ids;
pub mod project;
pub mod status;
pub mod task;
pub mod trace;
pub mod worker;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{EntryId, ProjectId, SessionId, TaskId, WorkerId};
pub use project::Project;
pub use status::{EntryKind, SessionStatus, TaskStatus, WorkerStatus};
pub use task::{Task, TaskDraft};
pub use trace::{TraceEntry, TraceSession};
pub use worker::{WorkerDescriptor, WorkerRecord};
