use crate::schema::SCHEMA;
use crate::statements::Statement;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use lamden_indexer_storage_api::{ContractRow, ReadStore, StoreError, WriteStore};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

/// A bound statement parameter.
#[derive(Debug, Clone, Copy)]
pub enum SqlParam<'a> {
    I64(i64),
    Text(&'a str),
    Json(&'a Value),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects with retry and bootstraps the schema.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = (|| async {
            PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(10))
                .connect(database_url)
                .await
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(1))
                .with_max_delay(Duration::from_secs(20))
                .with_max_times(10),
        )
        .notify(|err, dur| {
            tracing::info!(?err, ?dur, "retrying database connection");
        })
        .await
        .map_err(StoreError::backend)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for ddl in SCHEMA {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        }
        tracing::debug!("database schema is up to date");
        Ok(())
    }

    /// Runs one named statement on its own pooled connection, autocommitted.
    pub async fn execute(
        &self,
        statement: Statement,
        params: &[SqlParam<'_>],
    ) -> Result<Vec<PgRow>, StoreError> {
        let mut query = sqlx::query(statement.sql());
        for param in params {
            query = match param {
                SqlParam::I64(v) => query.bind(*v),
                SqlParam::Text(v) => query.bind(*v),
                SqlParam::Json(v) => query.bind(*v),
                SqlParam::Bool(v) => query.bind(*v),
            };
        }

        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        query.fetch_all(&mut *conn).await.map_err(|err| {
            tracing::error!(?statement, %err, "store statement failed");
            StoreError::backend(err)
        })
    }

    async fn select_block_num(
        &self,
        statement: Statement,
        key: &str,
    ) -> Result<Option<u64>, StoreError> {
        let rows = self.execute(statement, &[SqlParam::Text(key)]).await?;
        match rows.first() {
            Some(row) => {
                let block_num: i64 = row.try_get("block_num").map_err(StoreError::backend)?;
                Ok(Some(block_num as u64))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ReadStore for PgStore {
    async fn block_by_number(&self, number: u64) -> Result<Option<Value>, StoreError> {
        let rows = self
            .execute(Statement::BlockByNumber, &[SqlParam::I64(number as i64)])
            .await?;
        match rows.first() {
            Some(row) => Ok(Some(row.try_get("block").map_err(StoreError::backend)?)),
            None => Ok(None),
        }
    }

    async fn block_by_hash(&self, hash: &str) -> Result<Option<Value>, StoreError> {
        let rows = self
            .execute(Statement::BlockByHash, &[SqlParam::Text(hash)])
            .await?;
        match rows.first() {
            Some(row) => Ok(Some(row.try_get("block").map_err(StoreError::backend)?)),
            None => Ok(None),
        }
    }

    async fn state_block_num(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.select_block_num(Statement::StateBlockNum, key).await
    }

    async fn address_block_num(&self, address: &str) -> Result<Option<u64>, StoreError> {
        self.select_block_num(Statement::AddressBlockNum, address)
            .await
    }
}

#[async_trait]
impl WriteStore for PgStore {
    async fn upsert_block(
        &self,
        number: u64,
        hash: &str,
        content: &Value,
        created: &str,
    ) -> Result<(), StoreError> {
        self.execute(
            Statement::BlockUpsert,
            &[
                SqlParam::I64(number as i64),
                SqlParam::Text(hash),
                SqlParam::Json(content),
                SqlParam::Text(created),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_transaction(
        &self,
        block_num: u64,
        hash: &str,
        transaction: &Value,
        created: &str,
    ) -> Result<(), StoreError> {
        self.execute(
            Statement::TransactionUpsert,
            &[
                SqlParam::I64(block_num as i64),
                SqlParam::Text(hash),
                SqlParam::Json(transaction),
                SqlParam::Text(created),
            ],
        )
        .await?;
        Ok(())
    }

    async fn insert_reward(
        &self,
        block_num: u64,
        key: &str,
        value: &Value,
        reward: &Value,
        created: &str,
    ) -> Result<(), StoreError> {
        self.execute(
            Statement::RewardInsert,
            &[
                SqlParam::I64(block_num as i64),
                SqlParam::Text(key),
                SqlParam::Json(value),
                SqlParam::Json(reward),
                SqlParam::Text(created),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_state(
        &self,
        block_num: u64,
        key: &str,
        value: &Value,
        created: &str,
        updated: &str,
    ) -> Result<(), StoreError> {
        self.execute(
            Statement::StateUpsert,
            &[
                SqlParam::I64(block_num as i64),
                SqlParam::Text(key),
                SqlParam::Json(value),
                SqlParam::Text(created),
                SqlParam::Text(updated),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upsert_contract(&self, contract: ContractRow<'_>) -> Result<(), StoreError> {
        self.execute(
            Statement::ContractUpsert,
            &[
                SqlParam::I64(contract.block_num as i64),
                SqlParam::Text(contract.name),
                SqlParam::Text(contract.code),
                SqlParam::Bool(contract.lst001),
                SqlParam::Bool(contract.lst002),
                SqlParam::Bool(contract.lst003),
                SqlParam::Text(contract.created),
            ],
        )
        .await?;
        Ok(())
    }

    async fn insert_address(
        &self,
        block_num: u64,
        address: &str,
        created: &str,
    ) -> Result<(), StoreError> {
        self.execute(
            Statement::AddressInsert,
            &[
                SqlParam::I64(block_num as i64),
                SqlParam::Text(address),
                SqlParam::Text(created),
            ],
        )
        .await?;
        Ok(())
    }
}
