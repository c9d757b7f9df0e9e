// src/model.rs
//! News event record and its closed vocabularies (category, impact).
//!
//! Wire format follows the upstream news API: `impact_score` for the impact
//! level, numeric or string ids, and timestamps that may come without an
//! offset (read as UTC).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FeedError;
use crate::region::{self, Region};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Financial,
    Political,
    Geopolitical,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Financial, Self::Political, Self::Geopolitical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Political => "political",
            Self::Geopolitical => "geopolitical",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(v))
            .ok_or_else(|| UnknownVariant {
                kind: "category",
                value: v.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub const ALL: [Impact; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(v))
            .ok_or_else(|| UnknownVariant {
                kind: "impact",
                value: v.to_string(),
            })
    }
}

/// A single news record. Immutable once it has entered the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    /// Upstream id, unique per instance but NOT the dedup key.
    #[serde(deserialize_with = "de_event_id")]
    pub id: String,
    /// Canonical source URL; the dedup key.
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: String,
    pub category: Category,
    #[serde(rename = "impact_score", alias = "impact")]
    pub impact: Impact,
    #[serde(default)]
    pub companies: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(deserialize_with = "de_published_at")]
    pub published_at: DateTime<Utc>,
}

impl NewsEvent {
    /// Derived on demand, never stored.
    pub fn region(&self) -> Region {
        region::classify(self.latitude, self.longitude)
    }

    /// Structural checks serde cannot express.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.url.trim().is_empty() {
            return Err(FeedError::malformed("empty url"));
        }
        if self.id.trim().is_empty() {
            return Err(FeedError::malformed("empty id"));
        }
        if self.title.trim().is_empty() {
            return Err(FeedError::malformed("empty title"));
        }
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(FeedError::malformed(format!(
                "non-finite coordinates ({}, {})",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

/// Parse RFC 3339, or a naive ISO-8601 timestamp interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|n| n.and_utc())
}

fn de_published_at<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid published_at `{raw}`")))
}

pub(crate) fn de_event_id<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(d)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_upstream_payload_with_numeric_id_and_naive_timestamp() {
        let raw = r#"{
            "id": 42,
            "title": "Ações da PETR4 sobem após anúncio de lucros.",
            "url": "https://news.fake/1234",
            "category": "financial",
            "impact_score": "high",
            "latitude": -23.5505,
            "longitude": -46.6333,
            "published_at": "2024-05-01T12:30:00.123456",
            "location_name": "São Paulo"
        }"#;
        let ev: NewsEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.id, "42");
        assert_eq!(ev.impact, Impact::High);
        assert_eq!(ev.source, "");
        assert!(ev.summary.is_none());
        assert_eq!(ev.region(), Region::Sudeste);
        assert_eq!(
            ev.published_at.timestamp(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap().timestamp()
        );
    }

    #[test]
    fn impact_alias_and_rfc3339_offsets_are_accepted() {
        let raw = r#"{
            "id": "abc",
            "title": "t",
            "url": "https://x/1",
            "category": "political",
            "impact": "low",
            "latitude": 0.0,
            "longitude": 0.0,
            "published_at": "2024-05-01T09:00:00-03:00"
        }"#;
        let ev: NewsEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.impact, Impact::Low);
        assert_eq!(ev.published_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn vocabularies_parse_case_insensitively() {
        assert_eq!("Financial".parse::<Category>().unwrap(), Category::Financial);
        assert_eq!(" HIGH ".parse::<Impact>().unwrap(), Impact::High);
        let err = "sports".parse::<Category>().unwrap_err();
        assert_eq!(err.to_string(), "unknown category `sports`");
    }

    #[test]
    fn validate_rejects_blank_url_and_nan() {
        let mut ev: NewsEvent = serde_json::from_str(
            r#"{"id":"1","title":"t","url":" ","category":"financial","impact_score":"low",
                "latitude":1.0,"longitude":2.0,"published_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(matches!(ev.validate(), Err(FeedError::MalformedEvent(_))));
        ev.url = "https://x".into();
        ev.latitude = f64::NAN;
        assert!(ev.validate().is_err());
    }
}
