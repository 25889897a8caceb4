//! Worker identity and registration types.

use crate::{WorkerId, WorkerStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registration payload a worker presents on connect.
///
/// The `name` is the upsert key: the controller resolves it to an existing
/// [`WorkerRecord`] or creates a new one on first contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    /// Stable, unique worker name (e.g. "alpha").
    pub name: String,

    /// Kind of worker (e.g. "codegen").
    pub worker_type: String,

    /// Operating system of the worker host.
    pub os: String,

    /// Network address the worker reports for itself.
    pub address: String,

    /// Free-form host facts (cpu model, memory, labels).
    pub metadata: HashMap<String, String>,
}

impl WorkerDescriptor {
    /// Create a new descriptor with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worker_type: "codegen".to_string(),
            os: std::env::consts::OS.to_string(),
            address: String::new(),
            metadata: HashMap::new(),
        }
    }

    /// Builder method to set the worker type.
    pub fn with_worker_type(mut self, worker_type: impl Into<String>) -> Self {
        self.worker_type = worker_type.into();
        self
    }

    /// Builder method to set the reported address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Builder method to add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Durable record of a known worker.
///
/// Created on first registration, mutated on every heartbeat and status
/// report. The liveness subsystem only ever changes `status` and
/// `last_seen_at`; it never deletes the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Unique worker identifier, assigned at first registration.
    pub id: WorkerId,

    /// Stable, unique worker name (the upsert key).
    pub name: String,

    /// Kind of worker.
    pub worker_type: String,

    /// Operating system of the worker host.
    pub os: String,

    /// Network address the worker last reported.
    pub address: String,

    /// Controller-assigned role.
    pub role: String,

    /// Controller-assigned capability tags.
    pub capabilities: Vec<String>,

    /// Current liveness/activity status.
    pub status: WorkerStatus,

    /// What the worker reported it is doing (task title, step, ...).
    pub current_context: Option<String>,

    /// Last time any frame arrived from this worker.
    pub last_seen_at: DateTime<Utc>,

    /// Free-form host facts.
    pub metadata: HashMap<String, String>,

    /// When the worker first registered.
    pub registered_at: DateTime<Utc>,
}

impl WorkerRecord {
    /// Default role assigned to newly registered workers.
    pub const DEFAULT_ROLE: &'static str = "runner";

    /// Create a fresh record from a registration descriptor.
    pub fn from_descriptor(descriptor: WorkerDescriptor) -> Self {
        let now = Utc::now();
        Self {
            id: WorkerId::generate(),
            name: descriptor.name,
            worker_type: descriptor.worker_type,
            os: descriptor.os,
            address: descriptor.address,
            role: Self::DEFAULT_ROLE.to_string(),
            capabilities: Vec::new(),
            status: WorkerStatus::Online,
            current_context: None,
            last_seen_at: now,
            metadata: descriptor.metadata,
            registered_at: now,
        }
    }

    /// Refresh host facts from a re-registration. Identity, role and
    /// capabilities are preserved; only descriptor-sourced fields update.
    pub fn refresh_from(&mut self, descriptor: WorkerDescriptor) {
        self.worker_type = descriptor.worker_type;
        self.os = descriptor.os;
        self.address = descriptor.address;
        self.metadata = descriptor.metadata;
        self.status = WorkerStatus::Online;
        self.current_context = None;
        self.last_seen_at = Utc::now();
    }

    /// Mark contact from the worker without changing status.
    pub fn touch(&mut self) {
        self.last_seen_at = Utc::now();
    }
}
