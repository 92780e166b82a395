//! TaskFlow client CLI.
//!
//! One-shot commands over the TaskFlow API, exercising the same session
//! gate, resource cache, and mutation executor the interactive client
//! uses. Configuration via CLI flags, environment variables, or config
//! file (`~/.config/taskflow/config.toml`).
//!
//! ```bash
//! # List urgent tasks
//! taskflow --token $TOKEN list --priority urgent
//!
//! # Join team 42 from an invite link
//! taskflow --token $TOKEN join 42 --name Eng
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskflow::api::http::HttpApi;
use taskflow::api::MutationRequest;
use taskflow::cache::{ResourceCache, ResourceKey};
use taskflow::config::{CliArgs, ClientConfig, Command};
use taskflow::error::ApiError;
use taskflow::invite::{InviteFlow, InviteStage};
use taskflow::mutation::MutationExecutor;
use taskflow::session::Session;
use taskflow_proto::filter::TaskFilter;
use taskflow_proto::task::{NewTask, TaskId, TaskStatus};
use taskflow_proto::team::TeamId;

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
    tracing::info!("taskflow starting");

    let Some(command) = cli.command else {
        eprintln!("No command given; try --help");
        return ExitCode::FAILURE;
    };

    match run(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure
/// all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskflow.log");
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

async fn run(command: Command, config: ClientConfig) -> Result<(), ApiError> {
    let base = config
        .parsed_base_url()
        .map_err(|e| ApiError::Guard(e.to_string()))?;
    let api = Arc::new(HttpApi::new(base, config.token.clone(), config.timeout)?);

    // One-shot process: the token's presence settles the session outcome.
    let session = Arc::new(Session::resolved(config.token.is_some()));
    let cache = Arc::new(ResourceCache::new(Arc::clone(&api), Arc::clone(&session)));

    match command {
        Command::List { status, priority } => {
            let filter = TaskFilter { status, priority };
            let key = ResourceKey::task_list(&filter);
            if !session.is_authenticated() {
                eprintln!("Not logged in; set --token or TASKFLOW_TOKEN");
                return Ok(());
            }
            cache.read(&key);
            cache.wait_idle().await;
            let snapshot = cache.peek(&key);
            if let Some(error) = &snapshot.error {
                return Err(error.clone());
            }
            for task in snapshot.tasks().unwrap_or_default() {
                let done = if task.is_completed { "x" } else { " " };
                println!(
                    "[{done}] #{} {} ({}, {})",
                    task.id, task.title, task.priority, task.status
                );
            }
        }
        Command::Create {
            title,
            priority,
            due,
        } => {
            let executor = MutationExecutor::new(api, cache, session);
            let outcome = executor
                .mutate_async(MutationRequest::CreateTask(NewTask {
                    title,
                    priority,
                    status: TaskStatus::Todo,
                    due_date: due,
                }))
                .await?;
            if let Some(task) = outcome.task() {
                println!("Created task #{}", task.id);
            }
        }
        Command::Complete { id } => {
            let executor = MutationExecutor::new(api, cache, session);
            executor
                .mutate_async(MutationRequest::CompleteTask {
                    id: TaskId::new(id),
                })
                .await?;
            println!("Completed task #{id}");
        }
        Command::Delete { id } => {
            let executor = MutationExecutor::new(api, cache, session);
            executor
                .mutate_async(MutationRequest::DeleteTask {
                    id: TaskId::new(id),
                })
                .await?;
            println!("Deleted task #{id}");
        }
        Command::Join { team, name } => {
            let mut flow = InviteFlow::new(TeamId::new(team), name, api, cache.clone(), session);
            flow.evaluate();
            cache.wait_idle().await;
            flow.evaluate();
            flow.settle().await;
            match flow.view().stage {
                InviteStage::LoginRequired(url) => {
                    println!("Not logged in; visit {url}");
                }
                InviteStage::AlreadyMember => println!("You are already a member."),
                InviteStage::Joined(message) => println!("{message}"),
                InviteStage::JoinFailed(message) => {
                    eprintln!("Join failed: {message}");
                }
                InviteStage::InfoFailed(message) => {
                    eprintln!("Could not load invite info: {message}");
                }
                other => {
                    tracing::debug!(?other, "join flow did not settle");
                    eprintln!("Could not determine join state; try again.");
                }
            }
        }
    }

    Ok(())
}
