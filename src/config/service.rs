// src/config/service.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_SNAPSHOT_URL: &str = "FEED_SNAPSHOT_URL";
pub const ENV_POLL_SECS: &str = "FEED_POLL_SECS";
pub const ENV_VIEW_LIMIT: &str = "FEED_VIEW_LIMIT";

pub const MAX_VIEW_LIMIT: usize = 1000;
const MIN_QUEUE_CAPACITY: usize = 16;

fn default_view_limit() -> usize {
    100
}
fn default_queue_capacity() -> usize {
    crate::engine::DEFAULT_QUEUE_CAPACITY
}
fn default_snapshot_limit() -> usize {
    crate::ingest::providers::http_snapshot::DEFAULT_SNAPSHOT_LIMIT
}
fn default_fetch_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Upstream news API root for the JSON snapshot. When unset the snapshot
    /// is read from the configured RSS feeds instead.
    #[serde(default)]
    pub snapshot_url: Option<String>,
    /// `limit` sent with the upstream snapshot request.
    #[serde(default = "default_snapshot_limit")]
    pub snapshot_limit: usize,
    /// Per-request timeout for the upstream snapshot.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// RSS poll interval in seconds; 0 disables the poller.
    #[serde(default)]
    pub poll_secs: u64,
    /// Rows returned by list endpoints when the request gives no limit.
    #[serde(default = "default_view_limit")]
    pub view_limit: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            snapshot_url: None,
            snapshot_limit: default_snapshot_limit(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            poll_secs: 0,
            view_limit: default_view_limit(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML or JSON file (picked by extension, TOML otherwise).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading service config from {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let cfg: ServiceConfig = if is_json {
            serde_json::from_str(&data).context("parsing service config json")?
        } else {
            toml::from_str(&data).context("parsing service config toml")?
        };
        Ok(cfg.sanitized())
    }

    /// File from $FEED_CONFIG_PATH, else config/feed.toml, else config/feed.json,
    /// else defaults; then env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let base = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(PathBuf::from(p))?,
            Err(_) => {
                let toml_p = PathBuf::from("config/feed.toml");
                let json_p = PathBuf::from("config/feed.json");
                if toml_p.exists() {
                    Self::load_from_file(&toml_p)?
                } else if json_p.exists() {
                    Self::load_from_file(&json_p)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(ENV_SNAPSHOT_URL) {
            let url = url.trim();
            self.snapshot_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(secs) = parse_env(ENV_POLL_SECS) {
            self.poll_secs = secs;
        }
        if let Some(limit) = parse_env(ENV_VIEW_LIMIT) {
            self.view_limit = limit as usize;
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.view_limit = self.view_limit.clamp(1, MAX_VIEW_LIMIT);
        self.snapshot_limit = self.snapshot_limit.clamp(1, MAX_VIEW_LIMIT);
        self.fetch_timeout_secs = self.fetch_timeout_secs.max(1);
        self.queue_capacity = self.queue_capacity.max(MIN_QUEUE_CAPACITY);
        self.snapshot_url = self
            .snapshot_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }
}

fn parse_env(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
