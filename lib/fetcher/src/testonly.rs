//! Scripted fetch client for unit tests.

use crate::client::{FetchClient, FetchError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Json(Value),
    NetworkError,
}

/// Answers `get_json` from a URL-keyed script and records every call.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), Scripted::Json(body));
    }

    pub fn fail(&self, url: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), Scripted::NetworkError);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchClient for ScriptedClient {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_owned());
        match self.responses.lock().unwrap().get(url) {
            Some(Scripted::Json(value)) => Ok(value.clone()),
            Some(Scripted::NetworkError) => {
                Err(FetchError::Network("connection refused".to_owned()))
            }
            None => Err(FetchError::Network(format!("unscripted url {url}"))),
        }
    }
}
