// src/ingest/scheduler.rs
//! Periodic RSS poller. Each tick fetches every configured outlet and pushes
//! the items into the engine as stream arrivals; the store's url dedup drops
//! everything already seen.

use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::engine::FeedHandle;
use crate::ingest::types::SnapshotSource;
use crate::store::IngestOutcome;

#[derive(Clone, Copy, Debug)]
pub struct PollerCfg {
    pub interval_secs: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed_sources: usize,
}

/// Run one poll over `sources`. Provider errors are logged and counted, never fatal.
pub async fn poll_once(sources: &[Box<dyn SnapshotSource>], feed: &FeedHandle) -> PollReport {
    super::ensure_metrics_described();
    let mut report = PollReport::default();

    for s in sources {
        let events = match s.fetch_snapshot().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, provider = s.name(), "provider error");
                counter!("feed_provider_errors_total").increment(1);
                report.failed_sources += 1;
                continue;
            }
        };
        report.fetched += events.len();
        for ev in events {
            match feed.ingest_stream(ev).await {
                Ok(IngestOutcome::Inserted) => report.inserted += 1,
                Ok(IngestOutcome::Duplicate) => report.duplicates += 1,
                Err(e) => {
                    tracing::warn!(target: "ingest", error = %e, "engine gone; abandoning poll");
                    return report;
                }
            }
        }
    }

    let now = chrono::Utc::now().timestamp().max(0);
    gauge!("feed_poller_last_run_ts").set(now as f64);
    report
}

/// Spawn the poller. An interval of zero disables it (returns `None`).
pub fn spawn_feed_poller(
    cfg: PollerCfg,
    sources: Vec<Box<dyn SnapshotSource>>,
    feed: FeedHandle,
) -> Option<JoinHandle<()>> {
    if cfg.interval_secs == 0 || sources.is_empty() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let r = poll_once(&sources, &feed).await;
            tracing::info!(
                target: "ingest",
                fetched = r.fetched,
                inserted = r.inserted,
                duplicates = r.duplicates,
                failed = r.failed_sources,
                "feed poll tick"
            );
        }
    }))
}
