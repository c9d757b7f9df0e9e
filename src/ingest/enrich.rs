// src/ingest/enrich.rs
//! Keyword enrichment for feed items that arrive without structured metadata:
//! impact level, a map location and mentioned tickers.

use crate::model::Impact;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }
}

pub const CITIES: &[City] = &[
    City::new("São Paulo", -23.5505, -46.6333),
    City::new("Rio de Janeiro", -22.9068, -43.1729),
    City::new("Brasília", -15.7801, -47.9292),
    City::new("Belo Horizonte", -19.9167, -43.9345),
    City::new("Salvador", -12.9777, -38.5016),
    City::new("Manaus", -3.1190, -60.0217),
    City::new("Porto Alegre", -30.0346, -51.2177),
    City::new("Recife", -8.0476, -34.8770),
    City::new("Cuiabá", -15.6014, -56.0979),
    City::new("Curitiba", -25.4284, -49.2733),
];

/// Used when neither the text nor the feed config names a known city.
pub const FALLBACK_CITY: &str = "São Paulo";

pub const TICKERS: &[&str] = &["PETR4", "VALE3", "ITUB4", "BBDC4", "BBAS3", "WEGE3", "MGLU3"];

const HIGH_KEYWORDS: &[&str] = &["crise", "colapso", "recorde", "urgente", "guerra"];
const LOW_KEYWORDS: &[&str] = &["estável", "manutenção", "previsão", "leve"];

/// High keywords win over low ones; anything else is medium.
pub fn impact_for(text: &str) -> Impact {
    let lower = text.to_lowercase();
    if HIGH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Impact::High
    } else if LOW_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Impact::Low
    } else {
        Impact::Medium
    }
}

pub fn city_by_name(name: &str) -> Option<&'static City> {
    let name = name.trim().to_lowercase();
    CITIES.iter().find(|c| c.name.to_lowercase() == name)
}

/// First gazetteer city mentioned in `text` (case-insensitive).
pub fn locate(text: &str) -> Option<&'static City> {
    let lower = text.to_lowercase();
    CITIES.iter().find(|c| lower.contains(&c.name.to_lowercase()))
}

/// Comma-joined tickers mentioned in `text`, in list order.
pub fn extract_companies(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    let found: Vec<&str> = TICKERS
        .iter()
        .copied()
        .filter(|t| upper.contains(t))
        .collect();
    if found.is_empty() {
        None
    } else {
        Some(found.join(","))
    }
}
