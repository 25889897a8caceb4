//! DevGrid controller: worker presence, task dispatch and trace ingestion.
//!
//! One tokio process hosts the gRPC channel service workers connect to, the
//! operator HTTP API, the connection registry, the dispatch engine and the
//! liveness reaper, all sharing one [`state::AppState`].

pub mod config;
pub mod dispatch;
pub mod http;
pub mod metrics;
pub mod notify;
pub mod presence;
pub mod reaper;
pub mod registry;
pub mod service;
pub mod state;
pub mod store;
pub mod sync;
