// src/region.rs
//! Coarse Brazilian macro-region derived from coordinates.
//!
//! The ladder is ordered and first match wins; the rules overlap, so the order
//! is part of the semantics. Comparisons are strict. Anything that matches no
//! narrower rule lands in sudeste or sul.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Norte,
    Nordeste,
    CentroOeste,
    Sudeste,
    Sul,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Self::Norte,
        Self::Nordeste,
        Self::CentroOeste,
        Self::Sudeste,
        Self::Sul,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Norte => "norte",
            Self::Nordeste => "nordeste",
            Self::CentroOeste => "centro-oeste",
            Self::Sudeste => "sudeste",
            Self::Sul => "sul",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(v))
            .ok_or_else(|| UnknownVariant {
                kind: "region",
                value: v.to_string(),
            })
    }
}

/// Total and pure: every pair maps to exactly one region.
pub fn classify(lat: f64, lon: f64) -> Region {
    if lat > -5.0 {
        Region::Norte
    } else if lat > -10.0 && lon > -42.0 {
        Region::Nordeste
    } else if lat > -20.0 && lon < -50.0 {
        Region::CentroOeste
    } else if lat > -24.0 {
        Region::Sudeste
    } else {
        Region::Sul
    }
}
