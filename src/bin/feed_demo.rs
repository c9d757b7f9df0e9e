//! Offline demo: a fixture snapshot, a short push stream with one bad frame,
//! a filter change and a selection that expires.

use std::time::Duration;

use openfinance_feed::engine::{self, DEFAULT_QUEUE_CAPACITY};
use openfinance_feed::ingest::providers::http_snapshot::FixtureSnapshotSource;
use openfinance_feed::ingest::{refresh_snapshot, stream::pump_stream};
use openfinance_feed::selection::SELECTION_TIMEOUT;
use openfinance_feed::{Category, FilterSpec};
use tokio::sync::mpsc;

const SNAPSHOT: &str = r#"[
  {"id": 1, "title": "Petrobras anuncia dividendos recordes", "url": "https://demo.local/1",
   "category": "financial", "impact_score": "high", "companies": "PETR4",
   "location_name": "Rio de Janeiro", "latitude": -22.9068, "longitude": -43.1729,
   "published_at": "2024-05-01T10:00:00"},
  {"id": 2, "title": "Congresso vota reforma tributária", "url": "https://demo.local/2",
   "category": "political", "impact_score": "medium",
   "location_name": "Brasília", "latitude": -15.7939, "longitude": -47.8828,
   "published_at": "2024-05-01T11:00:00"}
]"#;

const STREAM: [&str; 3] = [
    r#"{"id": 3, "title": "Chuvas afetam safra no Sul", "url": "https://demo.local/3",
        "category": "financial", "impact_score": "low",
        "location_name": "Porto Alegre", "latitude": -30.0346, "longitude": -51.2177,
        "published_at": "2024-05-01T12:00:00"}"#,
    r#"{"id": 4, "title": "frame sem url"}"#,
    r#"{"id": 99, "title": "Petrobras anuncia dividendos (repost)", "url": "https://demo.local/1",
        "category": "financial", "impact_score": "high",
        "latitude": 0.0, "longitude": 0.0, "published_at": "2024-05-02T00:00:00"}"#,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let (feed, _task) = engine::spawn(DEFAULT_QUEUE_CAPACITY);
    let mut notices = feed.subscribe();
    tokio::spawn(async move {
        while let Ok(n) = notices.recv().await {
            println!("notice: {n:?}");
        }
    });

    let source = FixtureSnapshotSource::from_fixture("demo", SNAPSHOT);
    let report = refresh_snapshot(&source, &feed).await?;
    println!("snapshot: {report:?}");

    let (tx, rx) = mpsc::channel(8);
    let pump = tokio::spawn(pump_stream(rx, feed.clone()));
    for frame in STREAM {
        tx.send(frame.to_string()).await?;
    }
    drop(tx);
    println!("stream: {:?}", pump.await?);

    for ev in feed.current_view(None).await? {
        println!("  {} [{}] {} ({})", ev.published_at, ev.region(), ev.title, ev.id);
    }

    feed.set_filter(FilterSpec::all().with_category(Category::Financial))
        .await?;
    println!("financial only: {}", feed.current_view(None).await?.len());

    feed.select("1").await?;
    println!("selected: {:?}", feed.selection().await?);
    tokio::time::sleep(SELECTION_TIMEOUT + Duration::from_millis(100)).await;
    println!("after timeout: {:?}", feed.selection().await?);

    println!("feed-demo done");
    Ok(())
}
