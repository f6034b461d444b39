use crate::{is_valid_address, standards};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Decoding failures for raw block payloads.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// The source answered with an `error` field instead of a block.
    #[error("block reported invalid by source: {0}")]
    Invalid(String),
    /// A required field is missing or has the wrong type.
    #[error("malformed block data: field `{field}`: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl BlockError {
    fn malformed(field: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            field,
            reason: reason.to_string(),
        }
    }
}

/// A single key/value change produced by a transaction or by rewards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateChange {
    pub key: String,
    pub value: Value,
}

/// One reward entry attached to a block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RewardEntry {
    pub key: String,
    pub value: Value,
    pub reward: Value,
}

/// A `submission.submit_contract` call extracted from the transaction
/// payload, classified against the token standards.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSubmission {
    pub name: String,
    pub code: String,
    pub lst001: bool,
    pub lst002: bool,
    pub lst003: bool,
}

/// The processed transaction envelope of a block.
#[derive(Debug, Clone)]
pub struct ProcessedTx {
    pub hash: String,
    /// `status == 0` on the wire.
    pub valid: bool,
    /// Transaction result; the literal string `"None"` normalizes to absent.
    pub result: Option<Value>,
    /// The envelope as stored: the raw `processed` object with `state` removed.
    pub payload: Value,
    pub state: Vec<StateChange>,
    pub sender: String,
    /// Sender plus `kwargs.to`, filtered to address-shaped strings.
    pub addresses: BTreeSet<String>,
    pub contract: Option<ContractSubmission>,
}

/// A decoded block. Pure value: all store policy (monotonicity checks,
/// first-seen addresses) lives in the ingest writer.
#[derive(Debug, Clone)]
pub struct Block {
    pub number: u64,
    pub hash: String,
    pub previous: String,
    /// HLC timestamp with the trailing `_N` counter stripped
    /// (`…Z_0` → `…Z`); `-infinity` for the genesis block.
    pub timestamp: String,
    /// The full raw payload, kept opaque for the `blocks` table.
    pub content: Value,
    pub rewards: Vec<RewardEntry>,
    pub processed: Option<ProcessedTx>,
    /// Set when the block was read back from the store rather than fetched,
    /// so the sync driver can skip re-ingesting it.
    pub from_store: bool,
}

#[derive(Deserialize)]
struct RawHeader {
    number: u64,
    hash: String,
    previous: String,
    hlc_timestamp: String,
}

#[derive(Deserialize)]
struct RawProcessed {
    hash: String,
    status: i64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    state: Vec<StateChange>,
    transaction: RawTxEnvelope,
}

#[derive(Deserialize)]
struct RawTxEnvelope {
    payload: RawPayload,
}

#[derive(Deserialize)]
struct RawPayload {
    sender: String,
    #[serde(default)]
    contract: Option<String>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    kwargs: Value,
}

impl Block {
    pub fn decode(raw: Value) -> Result<Self, BlockError> {
        Self::decode_inner(raw, false)
    }

    /// Decodes a payload read back from the `blocks` table.
    pub fn decode_stored(raw: Value) -> Result<Self, BlockError> {
        Self::decode_inner(raw, true)
    }

    fn decode_inner(raw: Value, from_store: bool) -> Result<Self, BlockError> {
        let map = raw
            .as_object()
            .ok_or_else(|| BlockError::malformed("block", "payload is not an object"))?;

        if let Some(err) = map.get("error") {
            let text = err
                .as_str()
                .map(str::to_owned)
                .unwrap_or_else(|| err.to_string());
            return Err(BlockError::Invalid(text));
        }

        let header: RawHeader = serde_json::from_value(Value::Object(map.clone()))
            .map_err(|e| BlockError::malformed("block", e))?;

        let rewards = match map.get("rewards") {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| BlockError::malformed("rewards", e))?,
            None => Vec::new(),
        };

        let processed = match map.get("processed") {
            Some(v) => Some(ProcessedTx::decode(v)?),
            None => None,
        };

        Ok(Self {
            number: header.number,
            timestamp: strip_hlc_counter(&header.hlc_timestamp),
            hash: header.hash,
            previous: header.previous,
            content: raw,
            rewards,
            processed,
            from_store,
        })
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.processed.as_ref().map(|tx| tx.hash.as_str())
    }

    pub fn tx_is_valid(&self) -> bool {
        self.processed.as_ref().is_some_and(|tx| tx.valid)
    }

    pub fn state(&self) -> &[StateChange] {
        self.processed
            .as_ref()
            .map(|tx| tx.state.as_slice())
            .unwrap_or_default()
    }

    pub fn is_new_contract(&self) -> bool {
        self.processed
            .as_ref()
            .is_some_and(|tx| tx.contract.is_some())
    }
}

impl ProcessedTx {
    fn decode(raw: &Value) -> Result<Self, BlockError> {
        let decoded: RawProcessed = serde_json::from_value(raw.clone())
            .map_err(|e| BlockError::malformed("processed", e))?;

        // The transaction row stores the envelope without the state list.
        let mut payload = raw.clone();
        if let Some(map) = payload.as_object_mut() {
            map.remove("state");
        }

        let result = match decoded.result {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s == "None" => None,
            Some(other) => Some(other),
        };

        let inner = decoded.transaction.payload;
        let mut addresses = BTreeSet::new();
        if is_valid_address(&inner.sender) {
            addresses.insert(inner.sender.clone());
        }
        if let Some(to) = inner.kwargs.get("to").and_then(Value::as_str) {
            if is_valid_address(to) {
                addresses.insert(to.to_owned());
            }
        }

        let contract = match (inner.contract.as_deref(), inner.function.as_deref()) {
            (Some("submission"), Some("submit_contract")) => {
                let name = inner
                    .kwargs
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        BlockError::malformed("kwargs", "contract submission without `name`")
                    })?;
                let code = inner
                    .kwargs
                    .get("code")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        BlockError::malformed("kwargs", "contract submission without `code`")
                    })?;
                Some(ContractSubmission::classify(name, code))
            }
            _ => None,
        };

        Ok(Self {
            hash: decoded.hash,
            valid: decoded.status == 0,
            result,
            payload,
            state: decoded.state,
            sender: inner.sender,
            addresses,
            contract,
        })
    }
}

impl ContractSubmission {
    pub fn classify(name: &str, code: &str) -> Self {
        Self {
            name: name.to_owned(),
            code: code.to_owned(),
            lst001: standards::is_lst001(code),
            lst002: standards::is_lst002(code),
            lst003: standards::is_lst003(code),
        }
    }
}

/// HLC timestamps carry a logical counter after the wall-clock part
/// (`2022-01-01T00:00:00.000000000Z_0`); only the wall-clock part is stored.
fn strip_hlc_counter(timestamp: &str) -> String {
    match timestamp.rfind("Z_") {
        Some(pos) => timestamp[..=pos].to_owned(),
        None => timestamp.to_owned(),
    }
}
