//! Shared application state.

use std::sync::Arc;

use crate::notify::Notifier;
use crate::registry::ConnectionRegistry;
use crate::store::{MemoryStore, RecordStore};

/// Shared application state: the record store, the connection registry and
/// the observer fan-out. These are the only shared mutable resources on the
/// controller.
pub struct AppState {
    /// Durable records (workers, tasks, projects, trace).
    pub store: Arc<dyn RecordStore>,

    /// Live channels keyed by worker id.
    pub registry: ConnectionRegistry,

    /// Observer fan-out for state-change notifications.
    pub notifier: Notifier,

    /// Static bearer token gating mutating HTTP routes, if configured.
    pub api_token: Option<String>,
}

impl AppState {
    /// Create state over the in-memory store, wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Create state over a specific store implementation.
    pub fn with_store(store: Arc<dyn RecordStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            registry: ConnectionRegistry::new(),
            notifier: Notifier::default(),
            api_token: None,
        })
    }

    /// Create state with an API token guarding mutating HTTP routes.
    pub fn with_api_token(token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(MemoryStore::new()),
            registry: ConnectionRegistry::new(),
            notifier: Notifier::default(),
            api_token: Some(token.into()),
        })
    }
}
