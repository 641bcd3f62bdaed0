//! HTTP client for a running getforget daemon

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use getforget::memory::MemoryEntry;
use getforget::memory::importance::DEFAULT_DECAY_HOURS;
use getforget::server::handlers::{ContentRequest, StatsResponse};
use getforget::service::{ChatReply, QueryMatch, StoredMemory};

use crate::error::{CliError, CliResult};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

pub struct DaemonClient {
    base_url: String,
    client: Client,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> CliResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of one memory, with the key percent-encoded as a single segment
    fn memory_url(&self, key: &str) -> CliResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CliError(format!("Invalid server URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| CliError(format!("Server URL '{}' cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "memories", key]);
        Ok(url)
    }

    pub async fn chat(&self, content: &str) -> CliResult<ChatReply> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&ContentRequest {
                content: content.to_string(),
            })
            .send()
            .await?;
        parse(response).await
    }

    pub async fn remember(&self, content: &str) -> CliResult<StoredMemory> {
        let response = self
            .client
            .post(self.url("/api/memories"))
            .json(&ContentRequest {
                content: content.to_string(),
            })
            .send()
            .await?;
        parse(response).await
    }

    pub async fn recall(&self, query: &str) -> CliResult<Vec<QueryMatch>> {
        let response = self
            .client
            .get(self.url("/api/memories/search"))
            .query(&[("q", query)])
            .send()
            .await?;
        parse(response).await
    }

    pub async fn list(&self) -> CliResult<BTreeMap<String, MemoryEntry>> {
        let response = self.client.get(self.url("/api/memories")).send().await?;
        parse(response).await
    }

    /// Fetch one entry, `None` when the daemon has no such key
    pub async fn show(&self, key: &str) -> CliResult<Option<StoredMemory>> {
        let response = self
            .client
            .get(self.memory_url(key)?)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse(response).await.map(Some)
    }

    /// Evict one entry; returns whether it existed
    pub async fn forget(&self, key: &str) -> CliResult<bool> {
        let response = self
            .client
            .delete(self.memory_url(key)?)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(error_from(response).await),
        }
    }

    pub async fn stats(&self) -> CliResult<StatsResponse> {
        let response = self.client.get(self.url("/api/stats")).send().await?;
        parse(response).await
    }

    /// Decay constant the daemon scores with. Falls back to the reference
    /// constant when the daemon's model has none.
    pub async fn decay_hours(&self) -> CliResult<f64> {
        let stats = self.stats().await?;
        Ok(stats.store.decay_hours.unwrap_or(DEFAULT_DECAY_HOURS))
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> CliResult<T> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }
    Ok(response.json().await?)
}

async fn error_from(response: Response) -> CliError {
    let status = response.status();
    let message = match response.json::<serde_json::Value>().await {
        Ok(body) => body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => String::from("no error details"),
    };
    CliError(format!("Daemon returned {status}: {message}"))
}
