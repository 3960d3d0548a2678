#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! State geometry and naming types.
//!
//! These types describe the geographic side of the join: one representative
//! point per state, the code space both datasets are normalized into, and
//! the code to name lookup shown in marker popups.

pub mod fips;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized state join key (uppercase USPS abbreviation when known).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateCode(String);

impl StateCode {
    /// Normalizes a raw state code from either dataset.
    ///
    /// Surrounding whitespace is trimmed. A one or two digit FIPS code is
    /// translated to its abbreviation (`"6"` and `"06"` both become `"CA"`).
    /// Anything else is uppercased and kept as-is.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();

        if (1..=2).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            let padded = format!("{trimmed:0>2}");
            if let Some(abbr) = fips::abbr_for_fips(&padded) {
                return Self(abbr.to_string());
            }
            return Self(padded);
        }

        Self(trimmed.to_uppercase())
    }

    /// Returns the normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A WGS84 point used for marker placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

/// One state from the boundary/centroid dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFeature {
    /// Normalized join key.
    pub code: StateCode,
    /// `properties.STATE` exactly as published.
    pub raw_code: String,
    /// `properties.NAME`.
    pub name: String,
    /// Representative point. `None` when the feature has no usable geometry.
    pub location: Option<GeoPoint>,
}

/// Mapping from state code to human-readable name.
///
/// Built once by folding every feature in order, so a code that appears
/// more than once keeps the name of the last feature carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateNameLookup(BTreeMap<StateCode, String>);

impl StateNameLookup {
    /// Builds the lookup from features (last-wins on duplicate codes).
    #[must_use]
    pub fn from_features(features: &[GeoFeature]) -> Self {
        Self(features.iter().fold(BTreeMap::new(), |mut acc, feature| {
            acc.insert(feature.code.clone(), feature.name.clone());
            acc
        }))
    }

    /// Returns the name for `code`, if any feature carried it.
    #[must_use]
    pub fn get(&self, code: &StateCode) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Number of distinct codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the lookup holds no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(code: &str, name: &str) -> GeoFeature {
        GeoFeature {
            code: StateCode::normalize(code),
            raw_code: code.to_string(),
            name: name.to_string(),
            location: None,
        }
    }

    #[test]
    fn normalizes_fips_to_abbreviation() {
        assert_eq!(StateCode::normalize("06").as_str(), "CA");
        assert_eq!(StateCode::normalize("6").as_str(), "CA");
        assert_eq!(StateCode::normalize(" 36 ").as_str(), "NY");
    }

    #[test]
    fn normalizes_abbreviation_case() {
        assert_eq!(StateCode::normalize("ca"), StateCode::normalize("CA"));
        assert_eq!(StateCode::normalize(" tx").as_str(), "TX");
    }

    #[test]
    fn unknown_codes_are_kept() {
        assert_eq!(StateCode::normalize("99").as_str(), "99");
        assert_eq!(StateCode::normalize("Guam").as_str(), "GUAM");
    }

    #[test]
    fn name_lookup_last_wins() {
        let lookup = StateNameLookup::from_features(&[
            feature("CA", "Calif."),
            feature("NY", "New York"),
            feature("06", "California"),
        ]);

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get(&StateCode::normalize("CA")), Some("California"));
        assert_eq!(lookup.get(&StateCode::normalize("NY")), Some("New York"));
        assert_eq!(lookup.get(&StateCode::normalize("TX")), None);
    }

    #[test]
    fn state_code_serializes_as_string() {
        let json = serde_json::to_string(&StateCode::normalize("06")).unwrap();
        assert_eq!(json, "\"CA\"");
    }
}
