//! HTTP request handlers.

mod health;
mod projects;
mod tasks;
mod trace;
mod workers;

pub use health::{health_check, metrics_handler};
pub use projects::{create_project, list_projects};
pub use tasks::{create_task, get_task, list_tasks};
pub use trace::{get_session_entries, get_task_sessions};
pub use workers::{get_worker, list_workers, update_worker};
