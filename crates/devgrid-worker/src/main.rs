use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use devgrid_worker::config::Config;
use devgrid_worker::connection::{Identity, Outbound, WorkerConnection};
use devgrid_worker::executor::CommandExecutor;
use devgrid_worker::queue::{self, QueueContext, TaskQueue};
use devgrid_worker::tracelog::TraceLog;

const BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::parse());
    info!(
        name = %config.worker_name(),
        controller = %config.controller_addr,
        "Starting devgrid-worker"
    );

    let log = match TraceLog::open(config.data_dir.as_deref()) {
        Ok(log) => Arc::new(log),
        Err(e) => {
            error!(error = %e, "Failed to open trace log");
            return Err(e.into());
        }
    };

    let queue = TaskQueue::new();
    let outbound = Outbound::new();
    let identity = Identity::new();
    let executor = Arc::new(CommandExecutor::new(
        &config.command,
        config.command_args.clone(),
    ));

    // The queue runner outlives individual connections: a task keeps
    // executing through a reconnect and reports when a channel is back.
    tokio::spawn(queue::run(
        queue.clone(),
        executor,
        QueueContext {
            outbound: outbound.clone(),
            log: log.clone(),
        },
    ));

    let connection = WorkerConnection::new(
        config.clone(),
        log,
        queue,
        outbound,
        identity,
    );

    let mut backoff = BACKOFF_INITIAL;
    loop {
        let started = std::time::Instant::now();
        match connection.run_once().await {
            Ok(()) => info!("Channel closed, reconnecting"),
            Err(e) => {
                warn!(error = %e, delay_secs = backoff.as_secs(), "Connection lost, retrying")
            }
        }
        // A connection that held for a while resets the backoff; rapid
        // failures keep doubling it up to the cap.
        if started.elapsed() > BACKOFF_MAX {
            backoff = BACKOFF_INITIAL;
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(BACKOFF_MAX);
    }
}
