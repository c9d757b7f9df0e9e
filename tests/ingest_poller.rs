// tests/ingest_poller.rs
use std::time::Duration;

use async_trait::async_trait;
use openfinance_feed::engine::{self, DEFAULT_QUEUE_CAPACITY};
use openfinance_feed::ingest::config::FeedSource;
use openfinance_feed::ingest::providers::rss::RssSnapshotSource;
use openfinance_feed::ingest::scheduler::{poll_once, spawn_feed_poller, PollReport, PollerCfg};
use openfinance_feed::ingest::types::SnapshotSource;
use openfinance_feed::{Category, FeedError, NewsEvent};

struct Down;

#[async_trait]
impl SnapshotSource for Down {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsEvent>, FeedError> {
        Err(FeedError::transport("timeout"))
    }

    fn name(&self) -> &str {
        "down"
    }
}

fn fixture_sources() -> Vec<Box<dyn SnapshotSource>> {
    let feed = FeedSource::new(
        "Economia",
        "https://economia.example.org/feed",
        Category::Financial,
    );
    vec![
        Box::new(RssSnapshotSource::from_fixture(
            feed,
            include_str!("fixtures/rss_sample.xml"),
        )),
        Box::new(Down),
    ]
}

#[tokio::test]
async fn poll_once_pushes_items_and_tolerates_provider_errors() {
    let (feed, _task) = engine::spawn(DEFAULT_QUEUE_CAPACITY);
    let sources = fixture_sources();

    let first = poll_once(&sources, &feed).await;
    assert_eq!(
        first,
        PollReport {
            fetched: 3,
            inserted: 3,
            duplicates: 0,
            failed_sources: 1,
        }
    );

    // next tick sees the same items: all collapse on url
    let second = poll_once(&sources, &feed).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 3);
    assert_eq!(feed.stats().await.unwrap().events, 3);
}

#[tokio::test]
async fn zero_interval_or_no_sources_disables_poller() {
    let (feed, _task) = engine::spawn(DEFAULT_QUEUE_CAPACITY);
    let off = PollerCfg { interval_secs: 0 };
    assert!(spawn_feed_poller(off, fixture_sources(), feed.clone()).is_none());
    assert!(spawn_feed_poller(PollerCfg { interval_secs: 5 }, Vec::new(), feed).is_none());
}

#[tokio::test(start_paused = true)]
async fn poller_runs_on_first_tick() {
    let (feed, _task) = engine::spawn(DEFAULT_QUEUE_CAPACITY);
    let handle = spawn_feed_poller(PollerCfg { interval_secs: 60 }, fixture_sources(), feed.clone())
        .expect("poller enabled");

    // interval's first tick completes immediately
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(feed.stats().await.unwrap().events, 3);
    handle.abort();
}
