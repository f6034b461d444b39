use crate::metrics::METRICS;
use anyhow::Context;
use lamden_indexer_config::ConfigStore;
use lamden_indexer_fetcher::BlockFetcher;
use lamden_indexer_genesis::GenesisFiles;
use lamden_indexer_ingest::IngestWriter;
use lamden_indexer_notifier::Notifier;
use lamden_indexer_storage_api::Store;
use lamden_indexer_types::BlockId;
use std::sync::Arc;

pub struct SyncDriver<S> {
    store: Arc<S>,
    config: Arc<ConfigStore>,
    fetcher: BlockFetcher<S>,
    writer: IngestWriter<S>,
    notifier: Arc<dyn Notifier>,
}

impl<S: Store> SyncDriver<S> {
    pub fn new(
        store: Arc<S>,
        config: Arc<ConfigStore>,
        fetcher: BlockFetcher<S>,
        writer: IngestWriter<S>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            config,
            fetcher,
            writer,
            notifier,
        }
    }

    /// One invocation of the catch-up job.
    pub async fn tick(&self) -> anyhow::Result<()> {
        METRICS.ticks.inc();

        if !self.config.genesis_processed().await {
            let dir = self.config.genesis_block_dir().await;
            lamden_indexer_genesis::bootstrap(&GenesisFiles::new(dir), self.store.as_ref())
                .await
                .context("genesis bootstrap failed")?;
            self.config.set_genesis_processed(true).await?;
        }

        let start = match self.config.sync_start().await {
            Some(start) => Some(start),
            // An unset cursor means "resume from the live tip".
            None => self.config.block_latest().await,
        };
        let Some(start) = start else {
            tracing::debug!("no sync cursor and no live tip yet");
            return Ok(());
        };
        let end = self.config.sync_end().await.unwrap_or(0);

        if start == end {
            tracing::debug!(start, "already synchronized");
            return Ok(());
        }

        if start < end {
            // Should not happen; reset both cursors for a full resync.
            self.config.set_sync_start(None).await?;
            self.config.set_sync_end(0).await?;
            let message = format!("Sync cursors corrupted: sync_start {start} < sync_end {end}");
            tracing::warn!(start, end, "{message}");
            self.notifier.send(&message).await;
            return Ok(());
        }

        self.walk(start, end).await
    }

    /// Walks backward from `start` until hitting `end` or the genesis block,
    /// ingesting every block that did not come out of the store.
    async fn walk(&self, start: u64, end: u64) -> anyhow::Result<()> {
        tracing::debug!(start, end, "catch-up walk started");

        let Some(mut block) = self.fetcher.get(&BlockId::Number(start), true).await? else {
            tracing::warn!(start, "walk halted, block unavailable; retrying next tick");
            return Ok(());
        };

        loop {
            if !block.from_store && block.number != 0 {
                self.writer.process(&block).await?;
                METRICS.blocks_walked.inc();
            }

            if block.number == end || block.number == 0 {
                // The next walk covers everything above the old start.
                self.config.set_sync_end(start).await?;
                self.config.set_sync_start(None).await?;
                tracing::info!(sync_end = start, "catch-up walk finalized");
                return Ok(());
            }

            let previous = self
                .fetcher
                .get(&BlockId::Hash(block.previous.clone()), true)
                .await?;
            let Some(previous) = previous else {
                tracing::warn!(
                    previous = %block.previous,
                    "walk halted, previous block unavailable; retrying next tick"
                );
                return Ok(());
            };

            self.config.set_sync_start(Some(previous.number)).await?;
            block = previous;
        }
    }
}
