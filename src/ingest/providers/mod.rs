// src/ingest/providers/mod.rs
pub mod http_snapshot;
pub mod rss;

use async_trait::async_trait;
use metrics::counter;

use crate::error::FeedError;
use crate::ingest::types::SnapshotSource;
use crate::model::NewsEvent;

/// Fans a snapshot out over several sources.
///
/// Individual failures are logged and skipped; the fetch only fails when every
/// source failed.
pub struct MultiSource {
    name: String,
    sources: Vec<Box<dyn SnapshotSource>>,
}

impl MultiSource {
    pub fn new(name: impl Into<String>, sources: Vec<Box<dyn SnapshotSource>>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl SnapshotSource for MultiSource {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsEvent>, FeedError> {
        let mut out = Vec::new();
        let mut failures = 0usize;
        for s in &self.sources {
            match s.fetch_snapshot().await {
                Ok(mut v) => out.append(&mut v),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        target: "ingest",
                        error = %e,
                        provider = s.name(),
                        "provider error"
                    );
                    counter!("feed_provider_errors_total").increment(1);
                }
            }
        }
        if !self.sources.is_empty() && failures == self.sources.len() {
            return Err(FeedError::Transport(format!(
                "all {failures} sources of `{}` failed",
                self.name
            )));
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
