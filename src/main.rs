//! OpenFinance feed service: binary entrypoint.
//! Boots the feed engine, the snapshot/poller ingestion and the Axum HTTP server.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use openfinance_feed::api::{self, AppState};
use openfinance_feed::config::ServiceConfig;
use openfinance_feed::engine;
use openfinance_feed::ingest::config::{builtin_feeds, load_feeds_default, FeedSource};
use openfinance_feed::ingest::providers::http_snapshot::HttpSnapshotSource;
use openfinance_feed::ingest::providers::rss::RssSnapshotSource;
use openfinance_feed::ingest::providers::MultiSource;
use openfinance_feed::ingest::refresh_snapshot;
use openfinance_feed::ingest::scheduler::{spawn_feed_poller, PollerCfg};
use openfinance_feed::ingest::types::SnapshotSource;
use openfinance_feed::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FEED_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FEED_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ingest=info,selection=info,engine=info,warn"));

    // Shuttle may already own the global subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

fn rss_sources(feeds: &[FeedSource], client: &reqwest::Client) -> Vec<Box<dyn SnapshotSource>> {
    feeds
        .iter()
        .map(|f| {
            let src = RssSnapshotSource::from_url(f.clone(), client.clone());
            Box::new(src) as Box<dyn SnapshotSource>
        })
        .collect()
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = ServiceConfig::load()?;
    let feeds = load_feeds_default().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "feed list unreadable; using built-in outlets");
        builtin_feeds()
    });
    let client = reqwest::Client::new();

    // Recorder first: anything recorded before it is installed is lost.
    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = %e, "metrics disabled");
            None
        }
    };

    let (feed, _engine_task) = engine::spawn(cfg.queue_capacity);

    let snapshot: Arc<dyn SnapshotSource> = match cfg.snapshot_url.as_deref() {
        Some(url) => Arc::new(
            HttpSnapshotSource::new(url)
                .with_limit(cfg.snapshot_limit)
                .with_timeout(cfg.fetch_timeout_secs),
        ),
        None => {
            let multi = MultiSource::new("rss", rss_sources(&feeds, &client));
            if multi.is_empty() {
                tracing::warn!("no RSS feeds configured; snapshot will stay empty");
            }
            Arc::new(multi)
        }
    };

    // Initial load; a failure leaves the store empty and the stream path usable.
    {
        let feed = feed.clone();
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            let _ = refresh_snapshot(snapshot.as_ref(), &feed).await;
        });
    }

    let _poller = spawn_feed_poller(
        PollerCfg {
            interval_secs: cfg.poll_secs,
        },
        rss_sources(&feeds, &client),
        feed.clone(),
    );

    let state = AppState {
        feed,
        snapshot,
        view_limit: cfg.view_limit,
    };
    let mut router = api::create_router(state);
    if let Some(m) = &metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
