use anyhow::Context;
use clap::{Parser, Subcommand};
use lamden_indexer_config::ConfigStore;
use lamden_indexer_fetcher::{BlockFetcher, FetchClient, HttpClient};
use lamden_indexer_ingest::IngestWriter;
use lamden_indexer_live_feed::LiveFeed;
use lamden_indexer_notifier::Notifier;
use lamden_indexer_storage::PgStore;
use lamden_indexer_sync::{SyncDriver, run_scheduler};
use lamden_indexer_types::BlockId;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Parser)]
#[command(name = "lamden-indexer", version, about = "Lamden chain indexer")]
struct Cli {
    /// Path to the durable JSON configuration document.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full service: live feed plus periodic catch-up (default).
    Run,
    /// Fetch and ingest the given block numbers once, then exit.
    SyncBlocks { numbers: Vec<u64> },
    /// Fetch and ingest an inclusive block range once, then exit.
    SyncRange { from: u64, to: u64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Arc::new(ConfigStore::load(&cli.config)?);
    lamden_indexer_observability::init_logging(config.log_level().await)?;

    let database_url = config
        .database_url()
        .await
        .context("`database_url` is not configured")?;
    let store = Arc::new(PgStore::connect(&database_url).await?);

    let notifier = lamden_indexer_notifier::from_config(config.telegram().await);
    let client: Arc<dyn FetchClient> = Arc::new(HttpClient::new(config.http_timeout().await)?);
    let fetcher = BlockFetcher::new(store.clone(), config.clone(), client, notifier.clone());
    let writer = IngestWriter::new(store.clone(), config.clone());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config, store, fetcher, writer, notifier).await,
        Command::SyncBlocks { numbers } => sync_once(&fetcher, &writer, numbers).await,
        Command::SyncRange { from, to } => {
            sync_once(&fetcher, &writer, (from..=to).collect()).await
        }
    }
}

async fn run(
    config: Arc<ConfigStore>,
    store: Arc<PgStore>,
    fetcher: BlockFetcher<PgStore>,
    writer: IngestWriter<PgStore>,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<()> {
    if let Some(port) = config.prometheus_port().await {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let exporter = vise_exporter::MetricsExporter::default();
        tokio::spawn(exporter.start(addr));
        tracing::info!(%addr, "metrics exporter started");
    }

    let driver = Arc::new(SyncDriver::new(
        store.clone(),
        config.clone(),
        fetcher,
        writer,
        notifier.clone(),
    ));
    let live_writer = Arc::new(IngestWriter::new(store.clone(), config.clone()));
    let live_feed = LiveFeed::new(config.clone(), live_writer, notifier);

    let interval = config.job_interval_sync().await;

    let mut tasks = JoinSet::new();
    tasks.spawn(async move {
        match run_scheduler(driver, interval).await {
            Ok(()) => tracing::warn!("scheduler component unexpectedly exited"),
            Err(err) => tracing::error!(?err, "scheduler component failed"),
        }
    });
    tasks.spawn(async move {
        match live_feed.run().await {
            Ok(()) => tracing::warn!("live feed component unexpectedly exited"),
            Err(err) => tracing::error!(?err, "live feed component failed"),
        }
    });

    while tasks.join_next().await.is_some() {}
    Ok(())
}

async fn sync_once(
    fetcher: &BlockFetcher<PgStore>,
    writer: &IngestWriter<PgStore>,
    numbers: Vec<u64>,
) -> anyhow::Result<()> {
    for number in numbers {
        match fetcher.get(&BlockId::Number(number), false).await? {
            Some(block) => {
                writer.process(&block).await?;
                tracing::info!(number, "block ingested");
            }
            None => tracing::warn!(number, "block could not be retrieved"),
        }
    }
    Ok(())
}
