mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use crate::commands::{completions, query, submit, sync, Context};
use crate::error::{exit_code_for, report_error};
use kneadback_client::{paths, ApiClient, OfflineQueue};
use kneadback_config as config;

#[derive(Debug, Parser)]
#[command(name = "kneadback", version, about = "kneadback feedback CLI")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[arg(long, global = true)]
    queue_path: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit one feedback record; queued locally if the server is unreachable
    Submit(submit::SubmitArgs),
    /// Redeliver queued submissions
    Sync(sync::SyncArgs),
    /// Show the offline queue
    Queue(sync::QueueArgs),
    /// List recent feedback, newest first
    List(query::ListArgs),
    /// Show one stored record by id
    Show(query::ShowArgs),
    Insights(query::InsightsArgs),
    Health(query::HealthArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        api_url,
        timeout_secs,
        queue_path,
        json,
        verbose,
        command,
    } = cli;

    if let Command::Completions(args) = command {
        return completions::emit(args);
    }

    let mut app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) if path.exists() => debug!(path = %path.display(), "config resolved"),
            Ok(path) => debug!(path = %path.display(), "config missing, using defaults"),
            Err(err) => debug!(error = %err, "config unavailable"),
        }
    }
    if let Some(raw) = api_url {
        app_config.client.api_url = config::parse_api_url(&raw)?;
    }
    if let Some(timeout) = timeout_secs {
        app_config.client.timeout_secs = config::validate_timeout(timeout)?;
    }
    if queue_path.is_some() {
        app_config.client.queue_path = queue_path;
    }
    let client_config = app_config.client;

    let queue_path = paths::resolve_queue_path(client_config.queue_path)
        .with_context(|| "resolve queue path")?;
    debug!(
        api_url = %client_config.api_url,
        queue = %queue_path.display(),
        "client configured"
    );

    let api = ApiClient::new(
        client_config.api_url,
        Duration::from_secs(client_config.timeout_secs),
    )
    .with_context(|| "build http client")?;
    let queue = OfflineQueue::new(queue_path)
        .with_backoff(Duration::from_millis(client_config.drain_backoff_ms));

    let ctx = Context {
        api: &api,
        queue: &queue,
        json,
    };

    match command {
        Command::Submit(args) => submit::submit(&ctx, args),
        Command::Sync(args) => sync::sync(&ctx, args),
        Command::Queue(args) => sync::queue_status(&ctx, args),
        Command::List(args) => query::list(&ctx, args),
        Command::Show(args) => query::show(&ctx, args),
        Command::Insights(args) => query::insights(&ctx, args),
        Command::Health(args) => query::health(&ctx, args),
        Command::Completions(_) => {
            unreachable!("completions command handled before client initialization")
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
