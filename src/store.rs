// src/store.rs
//! Canonical, deduplicated event collection.
//!
//! Keyed by `url` with first-seen-wins semantics: a later arrival for a url
//! that is already present is discarded even if its payload differs. The
//! store only grows.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::model::NewsEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub inserted: usize,
    pub duplicates: usize,
}

#[derive(Debug, Default)]
pub struct ReconciliationStore {
    events: Vec<NewsEvent>,
    by_url: HashMap<String, usize>,
    id_to_url: HashMap<String, String>,
}

impl ReconciliationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert iff the url is absent.
    pub fn ingest_one(&mut self, event: NewsEvent) -> IngestOutcome {
        if self.by_url.contains_key(&event.url) {
            debug!(
                target: "store",
                url = %url_fingerprint(&event.url),
                id = %event.id,
                "duplicate url ignored"
            );
            return IngestOutcome::Duplicate;
        }

        // ids are not the dedup key; the first url seen for an id keeps it
        self.id_to_url
            .entry(event.id.clone())
            .or_insert_with(|| event.url.clone());
        self.by_url.insert(event.url.clone(), self.events.len());
        self.events.push(event);
        IngestOutcome::Inserted
    }

    /// Ingest in order; duplicates inside the batch collapse to the first one.
    pub fn ingest_batch<I>(&mut self, events: I) -> BatchReport
    where
        I: IntoIterator<Item = NewsEvent>,
    {
        let mut report = BatchReport::default();
        for ev in events {
            match self.ingest_one(ev) {
                IngestOutcome::Inserted => report.inserted += 1,
                IngestOutcome::Duplicate => report.duplicates += 1,
            }
        }
        report
    }

    /// Current collection in insertion order.
    pub fn snapshot(&self) -> &[NewsEvent] {
        &self.events
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&NewsEvent> {
        let url = self.id_to_url.get(id)?;
        self.by_url.get(url).map(|&i| &self.events[i])
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Monotonic; equals the number of accepted insertions.
    pub fn revision(&self) -> u64 {
        self.events.len() as u64
    }
}

/// Short, stable fingerprint so logs never carry full upstream URLs.
pub fn url_fingerprint(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(url.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
