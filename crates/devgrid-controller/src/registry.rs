//! Explicit connection registry: maps a WorkerId to its one authoritative
//! live channel.
//!
//! All channel lookup goes through this object; there is no ambient global
//! connection table. Binding a worker id that is already bound evicts the
//! prior handle (dropping it closes the outbound stream), and unbinding is
//! guarded by connection id so a stale close can never unbind a fresh
//! reconnect.

use std::collections::HashMap;

use devgrid_proto::pb::ControllerFrame;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use devgrid_core::WorkerId;

/// Outbound handle for one accepted stream.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    /// Unique per accepted stream, independent of worker identity.
    pub connection_id: String,

    /// Sender side of the per-connection outbound buffer.
    pub tx: mpsc::Sender<ControllerFrame>,
}

impl ChannelHandle {
    /// Wrap an outbound sender with a fresh connection id.
    pub fn new(tx: mpsc::Sender<ControllerFrame>) -> Self {
        Self {
            connection_id: Uuid::new_v4().to_string(),
            tx,
        }
    }

    /// Fire-and-forget push onto this channel's buffer.
    pub fn try_send(&self, frame: ControllerFrame) -> bool {
        self.tx.try_send(frame).is_ok()
    }
}

/// Concurrency-safe map from WorkerId to the authoritative channel handle.
pub struct ConnectionRegistry {
    channels: RwLock<HashMap<WorkerId, ChannelHandle>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Bind a worker to a channel, returning the evicted prior handle if the
    /// worker was already bound. The caller drops the returned handle, which
    /// closes the stale stream.
    pub async fn bind(&self, worker_id: WorkerId, handle: ChannelHandle) -> Option<ChannelHandle> {
        let evicted = self.channels.write().await.insert(worker_id.clone(), handle);
        if evicted.is_some() {
            debug!(worker_id = %worker_id, "Evicted prior channel on rebind");
        }
        evicted
    }

    /// Unbind the worker only if `connection_id` is still the authoritative
    /// one. Returns true if an unbind happened.
    pub async fn unbind_if(&self, worker_id: &WorkerId, connection_id: &str) -> bool {
        let mut channels = self.channels.write().await;
        match channels.get(worker_id) {
            Some(handle) if handle.connection_id == connection_id => {
                channels.remove(worker_id);
                true
            }
            _ => false,
        }
    }

    /// Get the live channel handle for a worker, cloned so the caller does
    /// not hold the map lock.
    pub async fn sender_for(&self, worker_id: &WorkerId) -> Option<ChannelHandle> {
        self.channels.read().await.get(worker_id).cloned()
    }

    /// Push a frame onto every connected channel. Returns how many channels
    /// accepted the frame.
    pub async fn broadcast(&self, frame: ControllerFrame) -> usize {
        let channels = self.channels.read().await;
        let mut delivered = 0;
        for handle in channels.values() {
            if handle.try_send(frame.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Worker ids with a currently bound channel.
    pub async fn connected(&self) -> Vec<WorkerId> {
        self.channels.read().await.keys().cloned().collect()
    }

    /// Number of bound channels.
    pub async fn connected_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgrid_proto::pb::{controller_frame::Payload, HeartbeatAck};

    fn frame() -> ControllerFrame {
        ControllerFrame {
            payload: Some(Payload::HeartbeatAck(HeartbeatAck { timestamp_ms: 1 })),
        }
    }

    #[tokio::test]
    async fn bind_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let worker = WorkerId::new("alpha");

        assert!(registry.bind(worker.clone(), ChannelHandle::new(tx)).await.is_none());
        assert!(registry.sender_for(&worker).await.is_some());
        assert!(registry.sender_for(&WorkerId::new("beta")).await.is_none());
    }

    #[tokio::test]
    async fn rebind_evicts_prior_handle() {
        let registry = ConnectionRegistry::new();
        let worker = WorkerId::new("alpha");
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, _rx2) = mpsc::channel(4);

        let first = ChannelHandle::new(tx1);
        let first_id = first.connection_id.clone();
        registry.bind(worker.clone(), first).await;

        let second = ChannelHandle::new(tx2);
        let second_id = second.connection_id.clone();
        let evicted = registry.bind(worker.clone(), second).await;

        assert_eq!(evicted.unwrap().connection_id, first_id);
        assert_eq!(
            registry.sender_for(&worker).await.unwrap().connection_id,
            second_id
        );
    }

    #[tokio::test]
    async fn stale_close_does_not_unbind_reconnect() {
        let registry = ConnectionRegistry::new();
        let worker = WorkerId::new("alpha");
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, _rx2) = mpsc::channel(4);

        let first = ChannelHandle::new(tx1);
        let first_id = first.connection_id.clone();
        registry.bind(worker.clone(), first).await;

        let second = ChannelHandle::new(tx2);
        registry.bind(worker.clone(), second).await;

        // The evicted connection's teardown runs after the rebind.
        assert!(!registry.unbind_if(&worker, &first_id).await);
        assert!(registry.sender_for(&worker).await.is_some());
    }

    #[tokio::test]
    async fn authoritative_close_unbinds() {
        let registry = ConnectionRegistry::new();
        let worker = WorkerId::new("alpha");
        let (tx, _rx) = mpsc::channel(4);

        let handle = ChannelHandle::new(tx);
        let connection_id = handle.connection_id.clone();
        registry.bind(worker.clone(), handle).await;

        assert!(registry.unbind_if(&worker, &connection_id).await);
        assert!(registry.sender_for(&worker).await.is_none());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_channel() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        registry.bind(WorkerId::new("a"), ChannelHandle::new(tx1)).await;
        registry.bind(WorkerId::new("b"), ChannelHandle::new(tx2)).await;

        let delivered = registry.broadcast(frame()).await;
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
