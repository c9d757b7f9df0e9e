// src/ingest/stream.rs
//! Push-stream intake.
//!
//! The transport (handshake, framing) lives outside this crate; it hands raw
//! JSON payloads over an mpsc channel. Each payload is parsed on its own; a
//! bad one is dropped and the pump keeps going. When the channel closes the
//! engine is told once and the pump returns. There is no reconnect.

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::FeedHandle;
use crate::error::FeedError;
use crate::model::NewsEvent;
use crate::store::IngestOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub received: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

pub fn parse_stream_payload(raw: &str) -> Result<NewsEvent, FeedError> {
    let ev: NewsEvent = serde_json::from_str(raw.trim()).map_err(FeedError::malformed)?;
    ev.validate()?;
    Ok(ev)
}

/// Drain `rx` into the engine until the transport closes it.
pub async fn pump_stream(mut rx: mpsc::Receiver<String>, feed: FeedHandle) -> StreamStats {
    super::ensure_metrics_described();
    let mut stats = StreamStats::default();

    while let Some(raw) = rx.recv().await {
        stats.received += 1;

        let ev = match parse_stream_payload(&raw) {
            Ok(ev) => ev,
            Err(e) => {
                stats.malformed += 1;
                counter!("feed_stream_malformed_total").increment(1);
                warn!(
                    target: "ingest",
                    error = %e,
                    bytes = raw.len(),
                    "dropping malformed stream payload"
                );
                continue;
            }
        };

        match feed.ingest_stream(ev).await {
            Ok(IngestOutcome::Inserted) => stats.inserted += 1,
            Ok(IngestOutcome::Duplicate) => stats.duplicates += 1,
            Err(e) => {
                warn!(target: "ingest", error = %e, "engine gone; stopping stream pump");
                return stats;
            }
        }
        debug!(target: "ingest", received = stats.received, "stream event handled");
    }

    if let Err(e) = feed.stream_closed().await {
        warn!(target: "ingest", error = %e, "could not report stream close");
    }
    info!(
        target: "ingest",
        received = stats.received,
        inserted = stats.inserted,
        duplicates = stats.duplicates,
        malformed = stats.malformed,
        "stream closed"
    );
    stats
}
