//! DevGrid CLI - command line client for the controller HTTP API.

use clap::{Parser, Subcommand};
use serde::Deserialize;

/// DevGrid CLI - fleet management tool
#[derive(Parser)]
#[command(name = "devgrid")]
#[command(about = "CLI for the DevGrid controller", long_about = None)]
struct Cli {
    /// Controller HTTP address
    #[arg(short, long, env = "DEVGRID_API_ADDR", default_value = "http://[::1]:8080")]
    addr: String,

    /// Bearer token for mutating operations
    #[arg(long, env = "DEVGRID_API_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task and dispatch it to a worker
    #[command(name = "create-task")]
    CreateTask {
        /// Target worker id
        #[arg(short, long)]
        worker: String,

        /// Project id the task belongs to
        #[arg(short, long)]
        project: String,

        /// Task title
        #[arg(short, long)]
        title: String,

        /// Task description (what the worker should do)
        #[arg(short, long)]
        description: String,

        /// Task type
        #[arg(long)]
        task_type: Option<String>,

        /// Working directory on the worker
        #[arg(long)]
        work_dir: Option<String>,
    },

    /// Get a task by id
    #[command(name = "get-task")]
    GetTask {
        /// Task ID
        id: String,
    },

    /// List all tasks
    #[command(name = "list-tasks")]
    ListTasks,

    /// List registered workers
    #[command(name = "list-workers")]
    ListWorkers,

    /// Create a project
    #[command(name = "create-project")]
    CreateProject {
        /// Project name
        #[arg(short, long)]
        name: String,

        /// Root path on disk
        #[arg(short, long)]
        root_path: String,
    },

    /// List projects
    #[command(name = "list-projects")]
    ListProjects,

    /// List trace sessions of a task
    #[command(name = "task-sessions")]
    TaskSessions {
        /// Task ID
        id: String,
    },

    /// List trace entries of a session
    #[command(name = "session-entries")]
    SessionEntries {
        /// Session ID
        id: String,
    },
}

#[derive(Deserialize)]
struct Worker {
    worker_id: String,
    name: String,
    role: String,
    status: String,
    current_context: Option<String>,
    connected: bool,
}

#[derive(Deserialize)]
struct Task {
    task_id: String,
    worker_id: String,
    title: String,
    task_type: String,
    status: String,
    result: Option<String>,
    error: Option<String>,
    created_at: String,
}

#[derive(Deserialize)]
struct CreatedTask {
    task: Task,
    dispatched: bool,
}

#[derive(Deserialize)]
struct Project {
    project_id: String,
    name: String,
    root_path: String,
    created_at: String,
}

#[derive(Deserialize)]
struct Session {
    session_id: String,
    task_id: String,
    worker_id: String,
    status: String,
    started_at_ms: i64,
    ended_at_ms: Option<i64>,
}

#[derive(Deserialize)]
struct Entry {
    kind: String,
    title: String,
    content: String,
    duration_ms: Option<i64>,
    timestamp_ms: i64,
}

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

struct Api {
    base: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl Api {
    fn new(base: String, token: Option<String>) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let response = self
            .client
            .get(format!("{}{}", self.base, path))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Self::parse(request.send().await?).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let message = match response.json::<ApiError>().await {
            Ok(e) => e.error,
            Err(_) => status.to_string(),
        };
        Err(format!("{status}: {message}").into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let api = Api::new(cli.addr, cli.token);

    match cli.command {
        Commands::CreateTask {
            worker,
            project,
            title,
            description,
            task_type,
            work_dir,
        } => {
            let created: CreatedTask = api
                .post(
                    "/v1/tasks",
                    serde_json::json!({
                        "worker_id": worker,
                        "project_id": project,
                        "title": title,
                        "description": description,
                        "task_type": task_type,
                        "work_dir": work_dir,
                    }),
                )
                .await?;
            if created.dispatched {
                println!("Task created (delivered to worker):");
            } else {
                println!("Task created (worker offline, will deliver on reconnect):");
            }
            print_task(&created.task);
        }
        Commands::GetTask { id } => {
            let task: Task = api.get(&format!("/v1/tasks/{id}")).await?;
            print_task(&task);
        }
        Commands::ListTasks => {
            let tasks: Vec<Task> = api.get("/v1/tasks").await?;
            println!("Tasks ({}):", tasks.len());
            println!(
                "{:<36}  {:<10}  {:<10}  {}",
                "ID", "STATUS", "TYPE", "TITLE"
            );
            println!("{}", "-".repeat(80));
            for task in tasks {
                println!(
                    "{:<36}  {:<10}  {:<10}  {}",
                    task.task_id, task.status, task.task_type, task.title
                );
            }
        }
        Commands::ListWorkers => {
            let workers: Vec<Worker> = api.get("/v1/workers").await?;
            println!("Workers ({}):", workers.len());
            println!(
                "{:<36}  {:<12}  {:<8}  {:<9}  {:<10}  {}",
                "ID", "NAME", "STATUS", "CONNECTED", "ROLE", "CONTEXT"
            );
            println!("{}", "-".repeat(100));
            for worker in workers {
                println!(
                    "{:<36}  {:<12}  {:<8}  {:<9}  {:<10}  {}",
                    worker.worker_id,
                    worker.name,
                    worker.status,
                    if worker.connected { "yes" } else { "no" },
                    worker.role,
                    worker.current_context.unwrap_or_default()
                );
            }
        }
        Commands::CreateProject { name, root_path } => {
            let project: Project = api
                .post(
                    "/v1/projects",
                    serde_json::json!({ "name": name, "root_path": root_path }),
                )
                .await?;
            println!("Project created:");
            print_project(&project);
        }
        Commands::ListProjects => {
            let projects: Vec<Project> = api.get("/v1/projects").await?;
            println!("Projects ({}):", projects.len());
            for project in projects {
                print_project(&project);
            }
        }
        Commands::TaskSessions { id } => {
            let sessions: Vec<Session> = api.get(&format!("/v1/tasks/{id}/sessions")).await?;
            println!("Sessions ({}):", sessions.len());
            for session in sessions {
                let ended = session
                    .ended_at_ms
                    .map(format_timestamp)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {}  {:<10}  {} -> {}  (worker {}, task {})",
                    session.session_id,
                    session.status,
                    format_timestamp(session.started_at_ms),
                    ended,
                    session.worker_id,
                    session.task_id,
                );
            }
        }
        Commands::SessionEntries { id } => {
            let entries: Vec<Entry> = api.get(&format!("/v1/sessions/{id}/entries")).await?;
            println!("Entries ({}):", entries.len());
            for entry in entries {
                let duration = entry
                    .duration_ms
                    .map(|ms| format!(" [{ms}ms]"))
                    .unwrap_or_default();
                println!(
                    "  {}  {:<14}  {}{}",
                    format_timestamp(entry.timestamp_ms),
                    entry.kind,
                    entry.title,
                    duration,
                );
                if !entry.content.is_empty() {
                    println!("      {}", entry.content);
                }
            }
        }
    }

    Ok(())
}

fn print_task(task: &Task) {
    println!("  ID:       {}", task.task_id);
    println!("  Worker:   {}", task.worker_id);
    println!("  Title:    {}", task.title);
    println!("  Type:     {}", task.task_type);
    println!("  Status:   {}", task.status);
    println!("  Created:  {}", task.created_at);
    if let Some(result) = &task.result {
        println!("  Result:   {result}");
    }
    if let Some(error) = &task.error {
        println!("  Error:    {error}");
    }
}

fn print_project(project: &Project) {
    println!("  ID:       {}", project.project_id);
    println!("  Name:     {}", project.name);
    println!("  Root:     {}", project.root_path);
    println!("  Created:  {}", project.created_at);
}

fn format_timestamp(ms: i64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    let d = Duration::from_millis(ms.max(0) as u64);
    let dt = UNIX_EPOCH + d;
    let datetime: chrono::DateTime<chrono::Utc> = dt.into();
    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}
