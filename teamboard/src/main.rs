//! `teamboard`: offline tools for the task reconciliation layer.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/teamboard/config.toml`).
//!
//! ```bash
//! # Show what an edit would send
//! cargo run --bin teamboard -- diff --previous before.json --next after.json
//!
//! # Replay a scripted session against a recording remote
//! TEAMBOARD_LOG=debug cargo run --bin teamboard -- replay script.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::de::DeserializeOwned;
use tracing_appender::non_blocking::WorkerGuard;

use teamboard::config::{CliArgs, ClientConfig, Command};
use teamboard::replay::{self, ReplayScript};
use teamboard::session::SessionError;
use teamboard::sync::{TaskDiff, diff};
use teamboard_proto::task::{Task, TaskUpdate};

/// Failures of the command-line front end.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("no command given; try `teamboard --help`")]
    NoCommand,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!("teamboard starting");

    let result = match cli.command {
        Some(Command::Diff { previous, next }) => run_diff(&previous, &next),
        Some(Command::Replay { script }) => run_replay(&script, &config).await,
        None => Err(CliError::NoCommand),
    };

    match result {
        Ok(()) => {
            tracing::info!("teamboard exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "teamboard failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Stdout carries command output, so logs go to a file. Returns a
/// [`WorkerGuard`] that must be held until shutdown to flush buffered
/// entries.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("teamboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn run_diff(previous: &Path, next: &Path) -> Result<(), CliError> {
    let previous: Vec<Task> = read_json(previous)?;
    let next: Vec<Task> = read_json(next)?;
    print!("{}", render_diff(&diff(&previous, &next)));
    Ok(())
}

async fn run_replay(script: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let script: ReplayScript = read_json(script)?;
    tracing::info!(steps = script.steps.len(), "replaying script");
    let log = replay::run(script, config.session_config()).await?;

    for (step, event) in &log.events {
        println!("step {step:>3}  {}", serde_json::to_string(event)?);
    }
    for request in &log.requests {
        println!("remote     {} {}", request.kind(), request.scope());
    }
    for rejection in &log.rejected {
        println!("rejected   {rejection}");
    }
    Ok(())
}

fn render_diff(d: &TaskDiff) -> String {
    let mut out = String::new();
    for task in &d.creates {
        out.push_str(&format!("+ {} {:?}{}\n", task.id, task.title, due(task.due_date_epoch_ms)));
    }
    for update in &d.updates {
        out.push_str(&format!("~ {}\n", describe_update(update)));
    }
    for id in &d.removes {
        out.push_str(&format!("- {id}\n"));
    }
    if d.order_changed {
        let order: Vec<&str> = d.next_order.iter().map(|id| id.as_str()).collect();
        out.push_str(&format!("order [{}]\n", order.join(", ")));
    }
    if d.is_empty() {
        out.push_str("no changes\n");
    }
    out
}

fn describe_update(update: &TaskUpdate) -> String {
    let state = if update.completed { "done" } else { "open" };
    let assignee = update
        .assignee
        .user_id
        .as_deref()
        .unwrap_or(update.assignee.name.as_str());
    let assignee = if assignee.is_empty() { "-" } else { assignee };
    format!(
        "{} {:?} {state} @{assignee}{}",
        update.task_id,
        update.title,
        due(update.due_date_epoch_ms)
    )
}

fn due(epoch_ms: Option<i64>) -> String {
    epoch_ms
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|at| format!(" due {}", at.format("%Y-%m-%d")))
        .unwrap_or_default()
}
