// src/filter.rs
//! Three-dimensional filter over category, impact and derived region.
//!
//! A spec is always replaced wholesale; there is no per-field mutation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{Category, Impact, NewsEvent};
use crate::region::{self, Region};

/// One filter dimension: either unconstrained or pinned to a single value.
/// On the wire this is the string `"all"` or the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(want) => want == value,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str("all"),
            Choice::Only(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl<T: FromStr> FromStr for Choice<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Choice::All);
        }
        s.parse().map(Choice::Only)
    }
}

impl<T: fmt::Display> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de, T> Deserialize<'de> for Choice<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub category: Choice<Category>,
    #[serde(default)]
    pub impact: Choice<Impact>,
    #[serde(default)]
    pub region: Choice<Region>,
}

impl FilterSpec {
    /// No constraint on any dimension.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, c: Category) -> Self {
        self.category = Choice::Only(c);
        self
    }

    pub fn with_impact(mut self, i: Impact) -> Self {
        self.impact = Choice::Only(i);
        self
    }

    pub fn with_region(mut self, r: Region) -> Self {
        self.region = Choice::Only(r);
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == Self::all()
    }
}

/// Logical AND across the three dimensions. Region is only computed when the
/// spec actually constrains it.
pub fn matches(event: &NewsEvent, spec: &FilterSpec) -> bool {
    spec.category.admits(&event.category)
        && spec.impact.admits(&event.impact)
        && match spec.region {
            Choice::All => true,
            Choice::Only(want) => region::classify(event.latitude, event.longitude) == want,
        }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_wire_format() {
        let c: Choice<Category> = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(c, Choice::All);
        let c: Choice<Region> = serde_json::from_str("\"centro-oeste\"").unwrap();
        assert_eq!(c, Choice::Only(Region::CentroOeste));
        assert_eq!(
            serde_json::to_string(&Choice::Only(Impact::Medium)).unwrap(),
            "\"medium\""
        );
        assert!(serde_json::from_str::<Choice<Impact>>("\"huge\"").is_err());
    }

    #[test]
    fn missing_dimensions_default_to_all() {
        let spec: FilterSpec = serde_json::from_str(r#"{"impact":"high"}"#).unwrap();
        assert_eq!(spec, FilterSpec::all().with_impact(Impact::High));
        assert!(!spec.is_unconstrained());
    }
}
