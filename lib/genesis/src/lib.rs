//! Genesis bootstrap.
//!
//! One-shot routine that loads the bundled genesis block plus its
//! state-changes files and writes everything under block number 0 with the
//! `-infinity` timestamp sentinel. Contract rows are synthesized from
//! `<name>.__code__` / `<name>.__submitted__` state pairs. Idempotent by
//! virtue of the underlying upserts; the caller gates it on the
//! `genesis_processed` flag.

use anyhow::Context;
use chrono::NaiveDate;
use lamden_indexer_storage_api::{ContractRow, Store};
use lamden_indexer_types::{Block, ContractSubmission, StateChange};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Timestamp sentinel for everything written by the bootstrap.
pub const GENESIS_TIMESTAMP: &str = "-infinity";

const CODE_SUFFIX: &str = ".__code__";
const SUBMITTED_SUFFIX: &str = ".__submitted__";

/// Locator for the bundled genesis files: `genesis_block.json` plus any
/// `state_changes*.json` next to (or below) it.
#[derive(Debug, Clone)]
pub struct GenesisFiles {
    dir: PathBuf,
}

impl GenesisFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads and decodes the genesis block, forcing the `-infinity`
    /// timestamp sentinel.
    pub fn load_block(&self) -> anyhow::Result<Block> {
        let path = self.dir.join("genesis_block.json");
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read genesis block {}", path.display()))?;
        let mut payload: Value = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse genesis block {}", path.display()))?;

        payload["hlc_timestamp"] = Value::String(GENESIS_TIMESTAMP.to_owned());

        Block::decode(payload).context("failed to decode genesis block")
    }

    /// Concatenates all state-changes files into one genesis-state list.
    pub fn load_state_changes(&self) -> anyhow::Result<Vec<StateChange>> {
        let mut paths = Vec::new();
        collect_state_files(&self.dir, &mut paths)
            .with_context(|| format!("failed to scan {}", self.dir.display()))?;
        paths.sort();

        let mut state = Vec::new();
        for path in paths {
            tracing::debug!(path = %path.display(), "adding genesis state changes");
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mut entries: Vec<StateChange> = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            state.append(&mut entries);
        }
        Ok(state)
    }
}

/// Writes the genesis block, its state and its contracts into the store.
pub async fn bootstrap<S: Store>(files: &GenesisFiles, store: &S) -> anyhow::Result<()> {
    let block = files.load_block()?;
    store
        .upsert_block(block.number, &block.hash, &block.content, &block.timestamp)
        .await?;
    tracing::info!(block_number = block.number, "saved genesis block");

    let state = files.load_state_changes()?;
    for entry in &state {
        store
            .upsert_state(
                0,
                &entry.key,
                &entry.value,
                GENESIS_TIMESTAMP,
                GENESIS_TIMESTAMP,
            )
            .await?;
    }
    tracing::info!(entries = state.len(), "saved genesis state");

    let lookup: HashMap<&str, &Value> = state
        .iter()
        .map(|entry| (entry.key.as_str(), &entry.value))
        .collect();

    let mut contracts = 0usize;
    for entry in &state {
        let Some(name) = entry.key.strip_suffix(CODE_SUFFIX) else {
            continue;
        };
        let Some(code) = entry.value.as_str() else {
            tracing::warn!(contract = name, "genesis contract code is not a string");
            continue;
        };

        let submitted = lookup
            .get(format!("{name}{SUBMITTED_SUFFIX}").as_str())
            .and_then(|value| value.get("__time__"))
            .and_then(submitted_timestamp);
        let Some(created) = submitted else {
            tracing::warn!(contract = name, "genesis contract has no submission time");
            continue;
        };

        let contract = ContractSubmission::classify(name, code);
        store
            .upsert_contract(ContractRow {
                block_num: 0,
                name: &contract.name,
                code: &contract.code,
                lst001: contract.lst001,
                lst002: contract.lst002,
                lst003: contract.lst003,
                created: &created,
            })
            .await?;
        contracts += 1;
    }
    tracing::info!(contracts, "saved genesis contracts");

    Ok(())
}

/// Converts a `__time__` integer list (`[y, m, d]` up to
/// `[y, m, d, h, min, s, µs]`) into an RFC 3339 timestamp.
fn submitted_timestamp(time: &Value) -> Option<String> {
    let parts: Vec<i64> = time
        .as_array()?
        .iter()
        .map(Value::as_i64)
        .collect::<Option<_>>()?;
    if parts.len() < 3 {
        return None;
    }

    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    let date = NaiveDate::from_ymd_opt(parts[0] as i32, parts[1] as u32, parts[2] as u32)?;
    let datetime = date.and_hms_micro_opt(part(3) as u32, part(4) as u32, part(5) as u32, part(6) as u32)?;

    Some(format!("{}Z", datetime.format("%Y-%m-%dT%H:%M:%S%.6f")))
}

fn collect_state_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_state_files(&path, out)?;
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with("state_changes") && name.ends_with(".json") {
                out.push(path);
            }
        }
    }
    Ok(())
}
