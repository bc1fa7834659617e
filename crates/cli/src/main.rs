use clap::{Parser, Subcommand};
use distress_core::analysis::HttpAnalysisClient;
use distress_core::batch::{BatchOptions, Orchestrator, OrchestratorError};
use distress_core::config::Settings;
use distress_core::storage::{FileSlot, PersistenceStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod console;

#[derive(Debug, Parser)]
#[command(name = "distress")]
struct Args {
    /// Analysis service base URL. Overrides ANALYSIS_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Path of the JSON file holding analyzed companies. Overrides DISTRESS_STORE_PATH.
    #[arg(long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze comma-separated tickers, e.g. `distress analyze "NVDA, ORCL"`.
    Analyze {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    /// Print every stored analysis.
    List,
    /// Remove every stored analysis.
    Clear,
    /// Check that the analysis service is reachable.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(base_url) = args.base_url {
        settings.analysis_base_url = Some(base_url);
    }
    if let Some(store) = args.store {
        settings.store_path = Some(store);
    }

    let res = run(args.command, &settings).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = ?err, "command failed");
    }
    res
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    let client = HttpAnalysisClient::from_settings(settings)?;

    match command {
        Command::Analyze { tickers } => {
            let Some(orchestrator) = hydrate(settings, client).await? else {
                return Ok(());
            };
            // Each argument may itself be a comma-separated list.
            let report = orchestrator.submit_batch(&tickers.join(",")).await?;
            tracing::debug!(
                attempted = report.attempted(),
                succeeded = report.succeeded(),
                "analyze finished"
            );
        }
        Command::List => {
            let Some(orchestrator) = hydrate(settings, client).await? else {
                return Ok(());
            };
            console::print_collection(&orchestrator.snapshot().await);
        }
        Command::Clear => {
            let Some(orchestrator) = hydrate(settings, client).await? else {
                return Ok(());
            };
            orchestrator.clear().await?;
        }
        Command::Health => {
            let health = client.health().await?;
            println!(
                "{}: {}",
                health.status,
                health.message.as_deref().unwrap_or("analysis service reachable")
            );
        }
    }

    Ok(())
}

/// `Ok(None)` when another run holds the store.
async fn hydrate(
    settings: &Settings,
    client: HttpAnalysisClient,
) -> anyhow::Result<Option<Orchestrator>> {
    let store = PersistenceStore::new(FileSlot::new(settings.store_path()));
    let res = Orchestrator::hydrate(
        store,
        Arc::new(client),
        Arc::new(console::ConsoleSink::default()),
        BatchOptions::from_settings(settings),
    )
    .await;

    match res {
        Ok(orchestrator) => Ok(Some(orchestrator)),
        Err(OrchestratorError::BatchInFlight) => {
            eprintln!(
                "{} is in use by another run; try again when it finishes",
                settings.store_path()
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
