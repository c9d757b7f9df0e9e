// src/ingest/providers/http_snapshot.rs
//! Snapshot from the upstream news API (`GET /api/v1/news`), plus a fixture
//! variant that parses the same JSON from memory.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::warn;

use crate::error::FeedError;
use crate::ingest::retain_valid;
use crate::ingest::types::SnapshotSource;
use crate::model::NewsEvent;

pub const DEFAULT_SNAPSHOT_LIMIT: usize = 100;

pub struct HttpSnapshotSource {
    endpoint: String,
    limit: usize,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSnapshotSource {
    /// `base_url` is the API root, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: format!("{}/api/v1/news", base_url.trim_end_matches('/')),
            limit: DEFAULT_SNAPSHOT_LIMIT,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsEvent>, FeedError> {
        let items: Vec<serde_json::Value> = self
            .client
            .get(&self.endpoint)
            .query(&[("limit", self.limit)])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(decode_items(items, "http-snapshot"))
    }

    fn name(&self) -> &str {
        "http-snapshot"
    }
}

/// Decode array entries one at a time; an entry that does not decode or
/// validate is dropped on its own without failing the snapshot.
fn decode_items(items: Vec<serde_json::Value>, origin: &str) -> Vec<NewsEvent> {
    let total = items.len();
    let events: Vec<NewsEvent> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value(item) {
            Ok(ev) => Some(ev),
            Err(e) => {
                warn!(target: "ingest", origin, idx, error = %e, "dropping undecodable event");
                None
            }
        })
        .collect();
    if events.len() < total {
        counter!("feed_provider_errors_total").increment((total - events.len()) as u64);
    }
    retain_valid(events, origin)
}

/// Parses a JSON array of events held in memory. Used by tests and the demo.
pub struct FixtureSnapshotSource {
    name: String,
    body: String,
}

impl FixtureSnapshotSource {
    pub fn from_fixture(name: impl Into<String>, body: &str) -> Self {
        Self {
            name: name.into(),
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl SnapshotSource for FixtureSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsEvent>, FeedError> {
        let items: Vec<serde_json::Value> = serde_json::from_str(&self.body)
            .map_err(|e| FeedError::Transport(format!("decoding snapshot body: {e}")))?;
        Ok(decode_items(items, &self.name))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
