use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Body(String),
}

/// HTTP GET seam of the fetcher. The production implementation is
/// [`HttpClient`]; tests script responses through
/// [`testonly::ScriptedClient`](crate::testonly::ScriptedClient).
#[async_trait]
pub trait FetchClient: Send + Sync + 'static {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FetchClient for HttpClient {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| FetchError::Body(err.to_string()))
    }
}
