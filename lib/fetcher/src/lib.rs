//! Block fetcher.
//!
//! Resolves a block id (number or hash) to a decoded [`Block`], consulting
//! the store first when asked, then walking the configured source list in
//! order. Source failover is a loop over tagged per-source outcomes rather
//! than error propagation: an `error` payload or a malformed body means
//! "this source does not have the block", a transport failure means "try
//! the next one". When every source fails the operator is notified once.

use lamden_indexer_config::{BlockSource, ConfigStore};
use lamden_indexer_genesis::GenesisFiles;
use lamden_indexer_notifier::Notifier;
use lamden_indexer_storage_api::ReadStore;
use lamden_indexer_types::{Block, BlockError, BlockId};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

mod client;
pub use client::{FetchClient, FetchError, HttpClient};

pub mod testonly;

#[cfg(test)]
mod tests;

enum SourceOutcome {
    Ok(Block),
    /// The source answered but does not have (or cannot serve) this block.
    Unknown(String),
    Unreachable(FetchError),
}

pub struct BlockFetcher<S> {
    store: Arc<S>,
    config: Arc<ConfigStore>,
    client: Arc<dyn FetchClient>,
    notifier: Arc<dyn Notifier>,
}

impl<S: ReadStore> BlockFetcher<S> {
    pub fn new(
        store: Arc<S>,
        config: Arc<ConfigStore>,
        client: Arc<dyn FetchClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            config,
            client,
            notifier,
        }
    }

    /// Resolves `id` to a block, or `None` when no source can deliver it.
    pub async fn get(&self, id: &BlockId, consult_store: bool) -> anyhow::Result<Option<Block>> {
        if consult_store {
            if let Some(raw) = self.lookup_store(id).await? {
                match Block::decode_stored(raw) {
                    Ok(block) => {
                        tracing::debug!(%id, "retrieved block from store");
                        return Ok(Some(block));
                    }
                    Err(err) => {
                        tracing::warn!(%id, %err, "stored block failed to decode, refetching");
                    }
                }
            }
        }

        for source in self.config.retrieve_from().await {
            match self.try_source(&source, id).await {
                SourceOutcome::Ok(block) => {
                    if block.number == 0 {
                        // A source handed us the genesis block; prefer the
                        // bundled file, which travels with its state files.
                        return Ok(Some(self.bundled_genesis().await.unwrap_or(block)));
                    }
                    return Ok(Some(block));
                }
                SourceOutcome::Unknown(reason) => {
                    tracing::warn!(%id, host = %source.host, %reason, "block unknown, trying next host");
                }
                SourceOutcome::Unreachable(err) => {
                    tracing::error!(%id, host = %source.host, %err, "source unreachable, trying next host");
                }
            }
        }

        if matches!(id, BlockId::Number(0)) {
            if let Some(genesis) = self.bundled_genesis().await {
                return Ok(Some(genesis));
            }
        }

        tracing::error!(%id, "no host able to deliver block");
        self.notifier
            .send(&format!("Block sync: no host able to deliver block {id}"))
            .await;
        Ok(None)
    }

    async fn lookup_store(&self, id: &BlockId) -> anyhow::Result<Option<Value>> {
        let raw = match id {
            BlockId::Number(number) => self.store.block_by_number(*number).await?,
            BlockId::Hash(hash) => self.store.block_by_hash(hash).await?,
        };
        Ok(raw)
    }

    async fn try_source(&self, source: &BlockSource, id: &BlockId) -> SourceOutcome {
        // The pre-wait applies to network attempts only, never to store hits.
        if source.wait > 0 {
            tracing::debug!(wait = source.wait, "waiting before source request");
            tokio::time::sleep(Duration::from_secs(source.wait)).await;
        }

        let url = source.host.replace("{block}", &id.to_string());
        tracing::debug!(%url, "retrieving block");

        let raw = match self.client.get_json(&url).await {
            Ok(raw) => raw,
            Err(err) => return SourceOutcome::Unreachable(err),
        };

        if raw.get("hash").and_then(Value::as_str) == Some("block-does-not-exist") {
            return SourceOutcome::Unknown("block-does-not-exist".to_owned());
        }

        match Block::decode(raw) {
            Ok(block) => SourceOutcome::Ok(block),
            Err(BlockError::Invalid(reason)) => SourceOutcome::Unknown(reason),
            Err(err @ BlockError::Malformed { .. }) => SourceOutcome::Unknown(err.to_string()),
        }
    }

    async fn bundled_genesis(&self) -> Option<Block> {
        let dir = self.config.genesis_block_dir().await;
        match GenesisFiles::new(&dir).load_block() {
            Ok(block) => Some(block),
            Err(err) => {
                tracing::warn!(dir = %dir.display(), %err, "could not load bundled genesis block");
                None
            }
        }
    }
}
