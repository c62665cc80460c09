use anyhow::{Context as _, Result};
use clap::Parser;
use kneadback_config as config;
use kneadback_server::{bind, serve, shutdown_signal, AppState, IngestionService};
use kneadback_store::{paths, Store};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

#[derive(Debug, Parser)]
#[command(name = "kneadback-server", version, about = "kneadback feedback ingestion server")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    db_path: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut app_config = config::load(cli.config).with_context(|| "load config")?;
    if let Some(host) = cli.host {
        app_config.server.host = host;
    }
    if let Some(port) = cli.port {
        app_config.server.port = config::validate_port(port)?;
    }
    let server = app_config.server;

    let db_path = paths::resolve_db_path(cli.db_path.or(server.db_path))
        .with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store =
        Store::open(&db_path).with_context(|| format!("open database {}", db_path.display()))?;
    let report = store
        .migrate()
        .with_context(|| "schema migration failed, refusing to serve")?;
    info!(
        from = report.from_version,
        to = report.to_version,
        added = ?report.added_columns,
        "schema ready"
    );
    store.feedback().ping().with_context(|| "database ping")?;

    let state = AppState::new(IngestionService::new(store, server.max_list_limit));
    let listener = bind(&server.host, server.port).await?;
    serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
