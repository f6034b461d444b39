//! Store traits at the seam between the sync engine and the relational
//! backend. The Postgres implementation lives in `lamden_indexer_storage`;
//! tests run against [`testonly::InMemoryStore`].

use async_trait::async_trait;
use serde_json::Value;

pub mod testonly;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store statement failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// A contract row as written by the ingest writer and the genesis bootstrap.
#[derive(Debug, Clone)]
pub struct ContractRow<'a> {
    pub block_num: u64,
    pub name: &'a str,
    pub code: &'a str,
    pub lst001: bool,
    pub lst002: bool,
    pub lst003: bool,
    pub created: &'a str,
}

/// Read-only view on the indexed chain, as needed by the fetcher (store
/// consult) and the ingest writer (monotonicity checks).
#[async_trait]
pub trait ReadStore: Send + Sync + 'static {
    /// Raw payload of a block by number, if indexed.
    async fn block_by_number(&self, number: u64) -> Result<Option<Value>, StoreError>;

    /// Raw payload of a block by hash, if indexed.
    async fn block_by_hash(&self, hash: &str) -> Result<Option<Value>, StoreError>;

    /// Block number currently recorded for a state key.
    async fn state_block_num(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Block number currently recorded for an address.
    async fn address_block_num(&self, address: &str) -> Result<Option<u64>, StoreError>;
}

/// Mutating statements. Every write is an idempotent upsert on the entity's
/// primary key; monotonicity policy is the caller's job.
#[async_trait]
pub trait WriteStore: Send + Sync + 'static {
    async fn upsert_block(
        &self,
        number: u64,
        hash: &str,
        content: &Value,
        created: &str,
    ) -> Result<(), StoreError>;

    async fn upsert_transaction(
        &self,
        block_num: u64,
        hash: &str,
        transaction: &Value,
        created: &str,
    ) -> Result<(), StoreError>;

    async fn insert_reward(
        &self,
        block_num: u64,
        key: &str,
        value: &Value,
        reward: &Value,
        created: &str,
    ) -> Result<(), StoreError>;

    async fn upsert_state(
        &self,
        block_num: u64,
        key: &str,
        value: &Value,
        created: &str,
        updated: &str,
    ) -> Result<(), StoreError>;

    async fn upsert_contract(&self, contract: ContractRow<'_>) -> Result<(), StoreError>;

    async fn insert_address(
        &self,
        block_num: u64,
        address: &str,
        created: &str,
    ) -> Result<(), StoreError>;
}

pub trait Store: ReadStore + WriteStore {}

impl<T: ReadStore + WriteStore> Store for T {}
