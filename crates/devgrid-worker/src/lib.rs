//! DevGrid worker agent: connects to the controller, executes assigned
//! tasks one at a time and keeps an offline-first local trace log.

pub mod config;
pub mod connection;
pub mod executor;
pub mod queue;
pub mod sync;
pub mod tracelog;
