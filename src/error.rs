// src/error.rs
//! Error taxonomy for the feed engine and its ingestion adapters.
//!
//! None of these are fatal: the worst outcome is a stale or empty view,
//! recoverable by another snapshot fetch. Duplicate arrivals are not errors,
//! see [`crate::store::IngestOutcome::Duplicate`].

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Snapshot fetch failed (network, HTTP status or body decode).
    #[error("transport error: {0}")]
    Transport(String),

    /// A stream payload could not be turned into a valid event.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// The engine task has stopped; its queue no longer accepts commands.
    #[error("feed engine is not running")]
    EngineClosed,
}

impl FeedError {
    pub fn transport(e: impl std::fmt::Display) -> Self {
        Self::Transport(e.to_string())
    }

    pub fn malformed(e: impl std::fmt::Display) -> Self {
        Self::MalformedEvent(e.to_string())
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
