// src/sequencer.rs
//! Recency ordering for views.

use crate::model::NewsEvent;

/// Most recent first. `sort_by` is stable, so events with equal timestamps
/// keep the order they arrived in.
pub fn order(mut events: Vec<NewsEvent>) -> Vec<NewsEvent> {
    events.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    events
}
