//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::Arc;

use devgrid_core::{TaskStatus, WorkerStatus};

use crate::state::AppState;

/// Collect all metrics from AppState and format as Prometheus text.
pub async fn collect_metrics(state: &Arc<AppState>) -> String {
    let mut output = String::new();

    collect_worker_metrics(state, &mut output).await;
    collect_task_metrics(state, &mut output).await;
    collect_channel_metrics(state, &mut output).await;

    output
}

/// Collect worker metrics by status.
async fn collect_worker_metrics(state: &Arc<AppState>, output: &mut String) {
    let workers = state.store.workers().await;

    // Count workers by status
    let mut online = 0u64;
    let mut idle = 0u64;
    let mut working = 0u64;
    let mut offline = 0u64;

    for worker in &workers {
        match worker.status {
            WorkerStatus::Online => online += 1,
            WorkerStatus::Idle => idle += 1,
            WorkerStatus::Working => working += 1,
            WorkerStatus::Offline => offline += 1,
        }
    }

    // Write Prometheus format
    writeln!(
        output,
        "# HELP devgrid_workers Number of known workers by status"
    )
    .ok();
    writeln!(output, "# TYPE devgrid_workers gauge").ok();
    writeln!(output, "devgrid_workers{{status=\"online\"}} {online}").ok();
    writeln!(output, "devgrid_workers{{status=\"idle\"}} {idle}").ok();
    writeln!(output, "devgrid_workers{{status=\"working\"}} {working}").ok();
    writeln!(output, "devgrid_workers{{status=\"offline\"}} {offline}").ok();
}

/// Collect task metrics by status.
async fn collect_task_metrics(state: &Arc<AppState>, output: &mut String) {
    let tasks = state.store.tasks().await;

    // Count tasks by status
    let mut pending = 0u64;
    let mut dispatched = 0u64;
    let mut completed = 0u64;
    let mut failed = 0u64;

    for task in &tasks {
        match task.status {
            TaskStatus::Pending => pending += 1,
            TaskStatus::Dispatched => dispatched += 1,
            TaskStatus::Completed => completed += 1,
            TaskStatus::Failed => failed += 1,
        }
    }

    // Write Prometheus format
    writeln!(output).ok();
    writeln!(
        output,
        "# HELP devgrid_tasks_total Total number of tasks by status"
    )
    .ok();
    writeln!(output, "# TYPE devgrid_tasks_total gauge").ok();
    writeln!(output, "devgrid_tasks_total{{status=\"pending\"}} {pending}").ok();
    writeln!(
        output,
        "devgrid_tasks_total{{status=\"dispatched\"}} {dispatched}"
    )
    .ok();
    writeln!(
        output,
        "devgrid_tasks_total{{status=\"completed\"}} {completed}"
    )
    .ok();
    writeln!(output, "devgrid_tasks_total{{status=\"failed\"}} {failed}").ok();
}

/// Collect live-channel metrics.
async fn collect_channel_metrics(state: &Arc<AppState>, output: &mut String) {
    let connected = state.registry.connected_count().await;

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP devgrid_channels_connected Number of live worker channels"
    )
    .ok();
    writeln!(output, "# TYPE devgrid_channels_connected gauge").ok();
    writeln!(output, "devgrid_channels_connected {connected}").ok();
}
