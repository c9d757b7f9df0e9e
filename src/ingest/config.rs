// src/ingest/config.rs
//! RSS feed list: which outlets the poller and the RSS snapshot read from.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::Category;

pub const ENV_FEEDS_PATH: &str = "FEED_SOURCES_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub category: Category,
    /// City used when an item's text names none of the known ones.
    #[serde(default)]
    pub default_city: Option<String>,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, category: Category) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            category,
            default_city: None,
        }
    }
}

/// Outlets used when nothing is configured.
pub fn builtin_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "InfoMoney",
            "https://www.infomoney.com.br/feed/",
            Category::Financial,
        ),
        FeedSource::new(
            "Investing.com",
            "https://br.investing.com/rss/news.rss",
            Category::Financial,
        ),
        FeedSource::new(
            "Agência Brasil",
            "https://agenciabrasil.ebc.com.br/rss/ultimasnoticias/feed.xml",
            Category::Political,
        ),
        FeedSource::new("Poder360", "https://www.poder360.com.br/feed/", Category::Political),
        FeedSource::new(
            "BBC Brasil",
            "https://feeds.bbci.co.uk/portuguese/rss.xml",
            Category::Geopolitical,
        ),
        FeedSource::new(
            "G1 Economia",
            "https://g1.globo.com/rss/g1/economia/",
            Category::Financial,
        ),
        FeedSource::new(
            "G1 Política",
            "https://g1.globo.com/rss/g1/politica/",
            Category::Political,
        ),
    ]
}

/// Load the feed list from an explicit path. Supports TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
}

/// Load the feed list using env var + fallbacks:
/// 1) $FEED_SOURCES_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) built-in outlets
pub fn load_feeds_default() -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_FEEDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        } else {
            return Err(anyhow!("{ENV_FEEDS_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_feeds_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_feeds_from(&json_p);
    }
    Ok(builtin_feeds())
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[feeds]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    // Try JSON array
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    // Fallback: also try TOML if not attempted
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed list format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedSource>> {
    #[derive(Deserialize)]
    struct TomlFeeds {
        feeds: Vec<FeedSource>,
    }
    let v: TomlFeeds = toml::from_str(s)?;
    Ok(clean_list(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<FeedSource>> {
    let v: Vec<FeedSource> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim, drop entries without name or url, keep the first entry per url.
fn clean_list(items: Vec<FeedSource>) -> Vec<FeedSource> {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        it.name = it.name.trim().to_string();
        it.url = it.url.trim().to_string();
        it.default_city = it
            .default_city
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if it.name.is_empty() || it.url.is_empty() {
            continue;
        }
        if seen.insert(it.url.clone()) {
            out.push(it);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn trims_and_dedups_in_both_formats() {
        let toml = r#"
[[feeds]]
name = " InfoMoney "
url = "https://www.infomoney.com.br/feed/"
category = "financial"

[[feeds]]
name = "dup"
url = "https://www.infomoney.com.br/feed/"
category = "political"

[[feeds]]
name = ""
url = "https://nameless.example/feed"
category = "political"
"#;
        let out = parse_toml(toml).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "InfoMoney");
        assert_eq!(out[0].category, Category::Financial);

        let json = r#"[{"name":"BBC Brasil","url":" https://feeds.bbci.co.uk/portuguese/rss.xml ",
                        "category":"geopolitical","default_city":"  "}]"#;
        let out = parse_json(json).unwrap();
        assert_eq!(out[0].url, "https://feeds.bbci.co.uk/portuguese/rss.xml");
        assert_eq!(out[0].default_city, None);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let json = r#"[{"name":"x","url":"https://x","category":"sports"}]"#;
        assert!(parse_feeds(json, "json").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Keep the repo's own config/ out of the way
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_FEEDS_PATH);

        // No files → built-in list
        let v = load_feeds_default().unwrap();
        assert_eq!(v, builtin_feeds());

        // Env wins
        let p_json = tmp.path().join("feeds.json");
        fs::write(
            &p_json,
            r#"[{"name":"X","url":"https://x/feed","category":"political"}]"#,
        )
        .unwrap();
        env::set_var(ENV_FEEDS_PATH, p_json.display().to_string());
        let v2 = load_feeds_default().unwrap();
        assert_eq!(v2.len(), 1);
        assert_eq!(v2[0].name, "X");
        env::remove_var(ENV_FEEDS_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
