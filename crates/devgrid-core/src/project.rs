//! Project records: the unit-of-work context a task runs against.

use crate::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project exists so dispatch can validate the unit-of-work context a task
/// references. Anything beyond create/list is ordinary persistence handled
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier.
    pub id: ProjectId,

    /// Human-readable project name.
    pub name: String,

    /// Root path of the project checkout on worker hosts.
    pub root_path: String,

    /// When the project was created.
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project.
    pub fn new(name: impl Into<String>, root_path: impl Into<String>) -> Self {
        Self {
            id: ProjectId::generate(),
            name: name.into(),
            root_path: root_path.into(),
            created_at: Utc::now(),
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: ProjectId) -> Self {
        self.id = id;
        self
    }
}
