//! Task execution.
//!
//! `TaskExecutor` is the seam between the channel plumbing and whatever
//! actually performs the work. The default `CommandExecutor` shells out to a
//! configured program with the task description on stdin, recording its
//! progress as trace entries along the way.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use devgrid_core::TraceEntry;
use devgrid_proto::pb::TaskAssigned;

use crate::tracelog::TraceRecorder;

/// Executor errors.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Command exited with {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Command terminated by signal")]
    Killed,
}

/// Executes one task assignment to a terminal outcome.
///
/// Implementations report progress through the recorder and return the
/// result summary on success. They must not panic: a failing task is an
/// `Err`, never a crashed worker.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        assignment: &TaskAssigned,
        recorder: &TraceRecorder,
    ) -> Result<String, ExecutorError>;
}

/// Runs a configured command per task, in the task's work dir when given.
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl TaskExecutor for CommandExecutor {
    async fn execute(
        &self,
        assignment: &TaskAssigned,
        recorder: &TraceRecorder,
    ) -> Result<String, ExecutorError> {
        info!(
            task_id = %assignment.task_id,
            program = %self.program,
            "Executing task"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("DEVGRID_TASK_ID", &assignment.task_id)
            .env("DEVGRID_TASK_TYPE", &assignment.task_type)
            .env("DEVGRID_TASK_TITLE", &assignment.title)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &assignment.work_dir {
            cmd.current_dir(dir);
        }

        recorder
            .record(
                TraceEntry::step(
                    recorder.session_id().clone(),
                    "Running command",
                    format!("{} {}", self.program, self.args.join(" ")),
                )
                .with_metadata("command", &self.program),
            )
            .await;

        let started = Instant::now();
        let mut child = cmd.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // Best effort: the command may not read stdin at all.
            let _ = stdin.write_all(assignment.description.as_bytes()).await;
        }

        let output = child.wait_with_output().await?;
        let duration_ms = started.elapsed().as_millis() as i64;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            debug!(task_id = %assignment.task_id, duration_ms, "Command succeeded");
            recorder
                .record(
                    TraceEntry::result(
                        recorder.session_id().clone(),
                        stdout.clone(),
                        Some(duration_ms),
                    )
                    .with_metadata("exit_code", "0"),
                )
                .await;
            Ok(stdout)
        } else {
            let code = output.status.code();
            recorder
                .record(
                    TraceEntry::error(recorder.session_id().clone(), stderr.clone())
                        .with_metadata(
                            "exit_code",
                            code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()),
                        )
                        .with_duration_ms(duration_ms),
                )
                .await;
            match code {
                Some(code) => Err(ExecutorError::NonZeroExit { code, stderr }),
                None => Err(ExecutorError::Killed),
            }
        }
    }
}
