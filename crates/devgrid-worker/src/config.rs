use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Worker agent configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "devgrid-worker", about = "DevGrid worker agent")]
pub struct Config {
    /// Controller gRPC endpoint
    #[arg(long, env = "DEVGRID_CONTROLLER_ADDR", default_value = "http://[::1]:50051")]
    pub controller_addr: String,

    /// Stable worker name; registration upserts by this name
    #[arg(long, env = "DEVGRID_WORKER_NAME")]
    pub name: Option<String>,

    /// Worker type advertised at registration
    #[arg(long, default_value = "codegen")]
    pub worker_type: String,

    /// Directory for the local trace log; in-memory when omitted
    #[arg(long, env = "DEVGRID_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Program invoked per task (task description on stdin)
    #[arg(long, default_value = "sh")]
    pub command: String,

    /// Arguments passed to the task command
    #[arg(long = "command-arg")]
    pub command_args: Vec<String>,

    /// Seconds between heartbeats
    #[arg(long, default_value_t = 30)]
    pub heartbeat_interval_secs: u64,
}

impl Config {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    /// Worker name, falling back to the hostname.
    pub fn worker_name(&self) -> String {
        self.name
            .clone()
            .or_else(sysinfo::System::host_name)
            .unwrap_or_else(|| "worker".to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller_addr: "http://[::1]:50051".to_string(),
            name: None,
            worker_type: "codegen".to_string(),
            data_dir: None,
            command: "sh".to_string(),
            command_args: Vec::new(),
            heartbeat_interval_secs: 30,
        }
    }
}
