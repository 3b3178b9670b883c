// inn-registry: look up Russian companies by INN from the command line.
//
// Prints JSON to stdout; logs go to stderr (RUST_LOG, default "info").

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inn_registry::{
    BatchRunner, FileWorkItems, LookupConfig, LookupOrchestrator, PageDriver, RecordSink,
    SqliteRecordStore, TargetProfile, TracingProgress, WorkItemSource,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "inn-registry",
    version,
    about = "Check companies against the IT company registry by INN"
)]
struct Cli {
    /// Bundled target profile
    #[arg(long, env = "INN_REGISTRY_PROFILE", default_value = "gosuslugi")]
    profile: String,

    /// JSON profile file; overrides --profile
    #[arg(long, env = "INN_REGISTRY_PROFILE_FILE")]
    profile_file: Option<PathBuf>,

    /// Show the browser window (debug builds only)
    #[arg(long, env = "INN_REGISTRY_HEADED")]
    headed: bool,

    /// SQLite database that receives every extracted record
    #[arg(long, env = "INN_REGISTRY_DB")]
    db: Option<PathBuf>,

    /// Directory for result_<inn>.html dumps
    #[arg(long, env = "INN_REGISTRY_DUMP_DIR")]
    dump_dir: Option<PathBuf>,

    /// Retries after a failed navigation
    #[arg(long, env = "INN_REGISTRY_RETRIES")]
    retries: Option<u32>,

    /// Seconds between consecutive lookups
    #[arg(long, env = "INN_REGISTRY_DELAY_SECS", default_value_t = 3)]
    delay_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up one INN
    Lookup { inn: String },
    /// Look up every INN in a JSON or text file
    Batch {
        input: PathBuf,
        /// Progress snapshot written after every item
        #[arg(long, env = "INN_REGISTRY_PROGRESS")]
        progress: Option<PathBuf>,
    },
    /// Print the tax figure for one INN
    Taxes { inn: String },
}

fn build_config(cli: &Cli) -> Result<LookupConfig> {
    let profile = match &cli.profile_file {
        Some(path) => TargetProfile::from_json_file(path)?,
        None => TargetProfile::preset(&cli.profile)?,
    };

    let mut builder = LookupConfig::builder()
        .profile(profile)
        .headless(!cli.headed)
        .inter_request_delay(Duration::from_secs(cli.delay_secs));
    if let Some(dir) = &cli.dump_dir {
        builder = builder.dump_dir(dir);
    }
    if let Some(retries) = cli.retries {
        builder = builder.max_retries(retries);
    }
    Ok(builder.build()?)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

async fn execute<D: PageDriver, S: RecordSink>(
    orchestrator: &mut LookupOrchestrator<D, S>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Lookup { inn } => {
            let outcome = orchestrator.lookup_one(&inn).await;
            print_json(&outcome)
        }
        Command::Batch { input, progress } => {
            let items = FileWorkItems::new(input).load().await?;
            let mut runner = BatchRunner::new(orchestrator).progress(Box::new(TracingProgress));
            if let Some(path) = progress {
                runner = runner.snapshot_path(path);
            }
            let outcomes = runner.run(items).await;
            print_json(&outcomes)
        }
        Command::Taxes { inn } => {
            let taxes = orchestrator.tax_fields(&inn).await?;
            print_json(&taxes)
        }
    }
}

async fn run_with<D: PageDriver, S: RecordSink>(
    mut orchestrator: LookupOrchestrator<D, S>,
    command: Command,
) -> Result<()> {
    let result = execute(&mut orchestrator, command).await;
    if let Err(e) = orchestrator.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("inn-registry v{}", env!("CARGO_PKG_VERSION"));
    let config = build_config(&cli)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let orchestrator = inn_registry::launch(&config)
        .await
        .context("Failed to start lookup session")?
        .with_cancellation(cancel);

    match &cli.db {
        Some(path) => {
            let store = SqliteRecordStore::open(path).await?;
            run_with(orchestrator.with_sink(store), cli.command).await
        }
        None => run_with(orchestrator, cli.command).await,
    }
}
