//! Ingest writer: turns one decoded block into the full set of derived
//! records.
//!
//! Writes happen in a fixed order (block, transaction, rewards, state,
//! addresses, contract) so a reader that sees a transaction row is
//! guaranteed to also see its block row. Any failure aborts the block; the
//! caller must not advance its cursor past an aborted block.

use crate::metrics::METRICS;
use lamden_indexer_config::ConfigStore;
use lamden_indexer_storage_api::{ContractRow, Store};
use lamden_indexer_types::{Block, StateChange};
use std::sync::Arc;
use std::time::Instant;

mod metrics;

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub struct IngestWriter<S> {
    store: Arc<S>,
    config: Arc<ConfigStore>,
}

impl<S: Store> IngestWriter<S> {
    pub fn new(store: Arc<S>, config: Arc<ConfigStore>) -> Self {
        Self { store, config }
    }

    pub async fn process(&self, block: &Block) -> anyhow::Result<()> {
        let started = Instant::now();

        self.store
            .upsert_block(block.number, &block.hash, &block.content, &block.timestamp)
            .await?;

        if let Some(tx) = &block.processed {
            self.store
                .upsert_transaction(block.number, &tx.hash, &tx.payload, &block.timestamp)
                .await?;
        }

        for reward in &block.rewards {
            self.store
                .insert_reward(
                    block.number,
                    &reward.key,
                    &reward.value,
                    &reward.reward,
                    &block.timestamp,
                )
                .await?;
        }

        // Rewards touch state like any transaction would.
        let reward_state: Vec<StateChange> = block
            .rewards
            .iter()
            .map(|reward| StateChange {
                key: reward.key.clone(),
                value: reward.value.clone(),
            })
            .collect();
        self.apply_state(block, &reward_state).await?;

        if let Some(tx) = block.processed.as_ref().filter(|tx| tx.valid) {
            self.apply_state(block, &tx.state).await?;
            self.insert_addresses(block, tx.addresses.iter()).await?;

            if let Some(contract) = &tx.contract {
                self.store
                    .upsert_contract(ContractRow {
                        block_num: block.number,
                        name: &contract.name,
                        code: &contract.code,
                        lst001: contract.lst001,
                        lst002: contract.lst002,
                        lst003: contract.lst003,
                        created: &block.timestamp,
                    })
                    .await?;
            }
        }

        if self.config.save_blocks_to_file().await {
            self.save_block_to_file(block).await?;
        }

        METRICS.blocks_processed.inc();
        METRICS.block_processing_time.observe(started.elapsed());
        tracing::debug!(
            block_number = block.number,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "processed block"
        );
        Ok(())
    }

    /// Monotonic-state rule: a write is discarded when an existing row has a
    /// strictly greater block number.
    async fn apply_state(&self, block: &Block, entries: &[StateChange]) -> anyhow::Result<()> {
        for entry in entries {
            if let Some(existing) = self.store.state_block_num(&entry.key).await? {
                if existing > block.number {
                    tracing::trace!(key = %entry.key, existing, "state skipped, newer row present");
                    continue;
                }
            }
            self.store
                .upsert_state(
                    block.number,
                    &entry.key,
                    &entry.value,
                    &block.timestamp,
                    &block.timestamp,
                )
                .await?;
        }
        Ok(())
    }

    /// Addresses record first-seen provenance: a write is discarded when an
    /// existing row has a strictly smaller block number.
    async fn insert_addresses(
        &self,
        block: &Block,
        addresses: impl Iterator<Item = &String>,
    ) -> anyhow::Result<()> {
        for address in addresses {
            if let Some(existing) = self.store.address_block_num(address).await? {
                if existing < block.number {
                    tracing::trace!(%address, existing, "address skipped, earlier row present");
                    continue;
                }
            }
            self.store
                .insert_address(block.number, address, &block.timestamp)
                .await?;
        }
        Ok(())
    }

    async fn save_block_to_file(&self, block: &Block) -> anyhow::Result<()> {
        let dir = self.config.block_dir().await;
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.json", block.number));
        std::fs::write(&path, serde_json::to_string_pretty(&block.content)?)?;
        tracing::debug!(block_number = block.number, path = %path.display(), "archived raw block");
        Ok(())
    }
}
