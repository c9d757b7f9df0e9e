// src/view.rs
//! Materialized view: store -> filter -> recency order.
//!
//! Always derived fresh from the current store and spec; nothing is cached.

use crate::filter::{self, FilterSpec};
use crate::model::NewsEvent;
use crate::sequencer;
use crate::store::ReconciliationStore;

pub fn project(store: &ReconciliationStore, spec: &FilterSpec) -> Vec<NewsEvent> {
    project_limited(store, spec, usize::MAX)
}

/// Like [`project`], truncated to the `limit` most recent rows.
pub fn project_limited(
    store: &ReconciliationStore,
    spec: &FilterSpec,
    limit: usize,
) -> Vec<NewsEvent> {
    let rows: Vec<NewsEvent> = store
        .snapshot()
        .iter()
        .filter(|e| filter::matches(e, spec))
        .cloned()
        .collect();
    let mut rows = sequencer::order(rows);
    rows.truncate(limit);
    rows
}
