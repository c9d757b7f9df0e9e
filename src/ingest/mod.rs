// src/ingest/mod.rs
//! Adapters that turn upstream snapshot and stream traffic into `NewsEvent`s
//! and hand them to the engine.

pub mod config;
pub mod enrich;
pub mod providers;
pub mod scheduler;
pub mod stream;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::engine::FeedHandle;
use crate::error::FeedError;
use crate::ingest::types::SnapshotSource;
use crate::model::NewsEvent;
use crate::store::{url_fingerprint, BatchReport};

/// Summary length cap for text coming out of feeds.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_metrics);
}

/// Attach help text to every feed series on the installed recorder.
/// Descriptions emitted before a recorder is installed are dropped.
pub fn describe_metrics() {
    describe_counter!(
        "feed_ingest_inserted_total",
        "Events accepted into the store, by channel."
    );
    describe_counter!(
        "feed_ingest_duplicate_total",
        "Arrivals discarded because their url was already stored, by channel."
    );
    describe_counter!(
        "feed_stream_malformed_total",
        "Stream payloads dropped because they failed to parse."
    );
    describe_counter!(
        "feed_snapshot_errors_total",
        "Snapshot fetches that failed; the store was left untouched."
    );
    describe_counter!(
        "feed_provider_errors_total",
        "Individual feed fetch/parse errors."
    );
    describe_counter!(
        "feed_selection_expired_total",
        "Selections cleared by their expiry timer."
    );
    describe_counter!("feed_rss_items_total", "Items parsed from RSS feeds, by feed.");
    describe_gauge!("feed_store_events", "Events currently held by the store.");
    describe_gauge!(
        "feed_poller_last_run_ts",
        "Unix ts when the feed poller last ran."
    );
    describe_gauge!(
        "feed_selection_timeout_ms",
        "Highlight lifetime of a selection in milliseconds."
    );
    describe_histogram!("feed_rss_parse_ms", "RSS parse time in milliseconds.");
}

/// Normalize text: decode entities, strip tags, collapse whitespace, cap length.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect::<String>().trim_end().to_string();
    }

    out
}

/// Drop events that fail structural validation, logging each one.
pub fn retain_valid(events: Vec<NewsEvent>, origin: &str) -> Vec<NewsEvent> {
    let before = events.len();
    let kept: Vec<NewsEvent> = events
        .into_iter()
        .filter(|ev| match ev.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    target: "ingest",
                    origin,
                    url = %url_fingerprint(&ev.url),
                    error = %e,
                    "dropping invalid event"
                );
                false
            }
        })
        .collect();
    if kept.len() < before {
        counter!("feed_provider_errors_total").increment((before - kept.len()) as u64);
    }
    kept
}

/// Fetch a full snapshot and apply it as one engine step.
///
/// On transport failure nothing is queued, so the store is exactly as before.
pub async fn refresh_snapshot(
    source: &dyn SnapshotSource,
    feed: &FeedHandle,
) -> Result<BatchReport, FeedError> {
    ensure_metrics_described();

    let events = match source.fetch_snapshot().await {
        Ok(v) => v,
        Err(e) => {
            warn!(target: "ingest", source = source.name(), error = %e, "snapshot fetch failed");
            counter!("feed_snapshot_errors_total").increment(1);
            return Err(e);
        }
    };

    let fetched = events.len();
    let report = feed.ingest_snapshot(events).await?;
    info!(
        target: "ingest",
        source = source.name(),
        fetched,
        inserted = report.inserted,
        duplicates = report.duplicates,
        "snapshot refreshed"
    );
    Ok(report)
}
