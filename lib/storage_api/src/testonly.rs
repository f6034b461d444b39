//! In-memory store used by unit tests across the workspace.

use crate::{ContractRow, ReadStore, StoreError, WriteStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord {
    pub block_num: u64,
    pub value: Value,
    pub created: String,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractRecord {
    pub block_num: u64,
    pub code: String,
    pub lst001: bool,
    pub lst002: bool,
    pub lst003: bool,
    pub created: String,
}

#[derive(Debug, Default)]
struct Inner {
    blocks: BTreeMap<u64, (String, Value, String)>,
    transactions: HashMap<String, (u64, Value, String)>,
    rewards: HashMap<(u64, String), (Value, Value, String)>,
    state: HashMap<String, StateRecord>,
    contracts: HashMap<String, ContractRecord>,
    addresses: HashMap<String, (u64, String)>,
}

/// Hash-map-backed [`Store`](crate::Store) with the same upsert semantics as
/// the Postgres adapter. Optionally fails all writes to exercise abort paths.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail, emulating a backend outage.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend(io::Error::other("injected write failure")));
        }
        Ok(())
    }

    pub fn block_count(&self) -> usize {
        self.inner.lock().unwrap().blocks.len()
    }

    pub fn block_numbers(&self) -> Vec<u64> {
        self.inner.lock().unwrap().blocks.keys().copied().collect()
    }

    pub fn transaction_count(&self) -> usize {
        self.inner.lock().unwrap().transactions.len()
    }

    pub fn reward_count(&self) -> usize {
        self.inner.lock().unwrap().rewards.len()
    }

    pub fn state_count(&self) -> usize {
        self.inner.lock().unwrap().state.len()
    }

    pub fn address_count(&self) -> usize {
        self.inner.lock().unwrap().addresses.len()
    }

    pub fn state_record(&self, key: &str) -> Option<StateRecord> {
        self.inner.lock().unwrap().state.get(key).cloned()
    }

    pub fn contract_record(&self, name: &str) -> Option<ContractRecord> {
        self.inner.lock().unwrap().contracts.get(name).cloned()
    }

    pub fn address_record(&self, address: &str) -> Option<u64> {
        self.inner
            .lock()
            .unwrap()
            .addresses
            .get(address)
            .map(|(block_num, _)| *block_num)
    }
}

#[async_trait]
impl ReadStore for InMemoryStore {
    async fn block_by_number(&self, number: u64) -> Result<Option<Value>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .blocks
            .get(&number)
            .map(|(_, content, _)| content.clone()))
    }

    async fn block_by_hash(&self, hash: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .blocks
            .values()
            .find(|(h, _, _)| h == hash)
            .map(|(_, content, _)| content.clone()))
    }

    async fn state_block_num(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .state
            .get(key)
            .map(|record| record.block_num))
    }

    async fn address_block_num(&self, address: &str) -> Result<Option<u64>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .addresses
            .get(address)
            .map(|(block_num, _)| *block_num))
    }
}

#[async_trait]
impl WriteStore for InMemoryStore {
    async fn upsert_block(
        &self,
        number: u64,
        hash: &str,
        content: &Value,
        created: &str,
    ) -> Result<(), StoreError> {
        self.write_guard()?;
        self.inner
            .lock()
            .unwrap()
            .blocks
            .insert(number, (hash.to_owned(), content.clone(), created.to_owned()));
        Ok(())
    }

    async fn upsert_transaction(
        &self,
        block_num: u64,
        hash: &str,
        transaction: &Value,
        created: &str,
    ) -> Result<(), StoreError> {
        self.write_guard()?;
        self.inner.lock().unwrap().transactions.insert(
            hash.to_owned(),
            (block_num, transaction.clone(), created.to_owned()),
        );
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
        self.write_guard()?;
        self.inner.lock().unwrap().rewards.insert(
            (block_num, key.to_owned()),
            (value.clone(), reward.clone(), created.to_owned()),
        );
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
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        let created = match inner.state.get(key) {
            // The conflict clause keeps the original `created`.
            Some(existing) => existing.created.clone(),
            None => created.to_owned(),
        };
        inner.state.insert(
            key.to_owned(),
            StateRecord {
                block_num,
                value: value.clone(),
                created,
                updated: updated.to_owned(),
            },
        );
        Ok(())
    }

    async fn upsert_contract(&self, contract: ContractRow<'_>) -> Result<(), StoreError> {
        self.write_guard()?;
        self.inner.lock().unwrap().contracts.insert(
            contract.name.to_owned(),
            ContractRecord {
                block_num: contract.block_num,
                code: contract.code.to_owned(),
                lst001: contract.lst001,
                lst002: contract.lst002,
                lst003: contract.lst003,
                created: contract.created.to_owned(),
            },
        );
        Ok(())
    }

    async fn insert_address(
        &self,
        block_num: u64,
        address: &str,
        created: &str,
    ) -> Result<(), StoreError> {
        self.write_guard()?;
        self.inner
            .lock()
            .unwrap()
            .addresses
            .insert(address.to_owned(), (block_num, created.to_owned()));
        Ok(())
    }
}
