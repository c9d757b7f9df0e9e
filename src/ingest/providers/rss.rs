// src/ingest/providers/rss.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::error::FeedError;
use crate::ingest::config::FeedSource;
use crate::ingest::enrich::{self, FALLBACK_CITY};
use crate::ingest::types::SnapshotSource;
use crate::ingest::{normalize_text, SUMMARY_MAX_CHARS};
use crate::model::NewsEvent;
use crate::store::url_fingerprint;

/// Items taken from a single feed per fetch.
pub const MAX_ITEMS_PER_FEED: usize = 10;

const USER_AGENT: &str = "OpenFinance/1.0 NewsBot";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond()))
}

/// One RSS outlet. Reads either an in-memory fixture or the live feed URL.
pub struct RssSnapshotSource {
    feed: FeedSource,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl RssSnapshotSource {
    pub fn from_fixture(feed: FeedSource, xml: &str) -> Self {
        Self {
            feed,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(feed: FeedSource, client: reqwest::Client) -> Self {
        Self {
            feed,
            mode: Mode::Http {
                client,
                timeout: Duration::from_secs(10),
            },
        }
    }

    /// Parse RSS 2.0 and enrich each item into an event.
    /// `fetched_at` stands in for items without a usable `pubDate`.
    pub fn parse_items(
        &self,
        xml: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<NewsEvent>, FeedError> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean)
            .map_err(|e| FeedError::Transport(format!("parsing {} rss xml: {e}", self.feed.name)))?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(MAX_ITEMS_PER_FEED));
        for it in rss.channel.item.into_iter().take(MAX_ITEMS_PER_FEED) {
            let title = normalize_text(it.title.as_deref().unwrap_or_default(), SUMMARY_MAX_CHARS);
            let url = it.link.as_deref().unwrap_or_default().trim().to_string();
            if title.is_empty() || url.is_empty() {
                continue;
            }
            out.push(self.enrich(title, url, &it, fetched_at));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_rss_parse_ms").record(ms);
        Ok(out)
    }

    fn enrich(
        &self,
        title: String,
        url: String,
        it: &Item,
        fetched_at: DateTime<Utc>,
    ) -> NewsEvent {
        let description = it.description.as_deref().unwrap_or_default();
        let summary = normalize_text(description, SUMMARY_MAX_CHARS);
        let summary = if summary.is_empty() {
            format!("Notícia de {}", self.feed.name)
        } else {
            summary
        };

        let text = format!("{title} {summary}");
        let city = enrich::locate(&text)
            .or_else(|| self.feed.default_city.as_deref().and_then(enrich::city_by_name))
            .or_else(|| enrich::city_by_name(FALLBACK_CITY));

        NewsEvent {
            id: url_fingerprint(&url),
            impact: enrich::impact_for(&text),
            companies: enrich::extract_companies(&text),
            location_name: city.map(|c| c.name.to_string()),
            latitude: city.map(|c| c.lat).unwrap_or_default(),
            longitude: city.map(|c| c.lon).unwrap_or_default(),
            published_at: it
                .pub_date
                .as_deref()
                .and_then(parse_rfc2822)
                .unwrap_or(fetched_at),
            category: self.feed.category,
            source: self.feed.name.clone(),
            summary: Some(summary),
            title,
            url,
        }
    }
}

#[async_trait]
impl SnapshotSource for RssSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsEvent>, FeedError> {
        let now = Utc::now();
        let events = match &self.mode {
            Mode::Fixture(s) => self.parse_items(s, now)?,
            Mode::Http { client, timeout } => {
                let body = client
                    .get(&self.feed.url)
                    .header(reqwest::header::USER_AGENT, USER_AGENT)
                    .timeout(*timeout)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                self.parse_items(&body, now)?
            }
        };
        counter!("feed_rss_items_total", "feed" => self.feed.name.clone())
            .increment(events.len() as u64);
        tracing::debug!(
            target: "ingest",
            feed = %self.feed.name,
            items = events.len(),
            "rss fetched"
        );
        Ok(events)
    }

    fn name(&self) -> &str {
        &self.feed.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
