// src/ingest/types.rs
use crate::error::FeedError;
use crate::model::NewsEvent;

/// One-shot bulk read of the current feed state.
///
/// Implementations must either return the complete snapshot or fail with
/// [`FeedError::Transport`]; nothing is applied from a failed fetch.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsEvent>, FeedError>;
    fn name(&self) -> &str;
}
