#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-state annual crime statistics types.
//!
//! A statistics dataset is a JSON array of flat objects, one per
//! `(state, year)` observation. Besides the fixed join and context fields
//! every record carries a variable set of `<category>_rate` columns; each
//! of those columns is a selectable crime [`CategoryKey`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

/// Suffix that marks a record field as a crime rate column.
pub const RATE_SUFFIX: &str = "_rate";

/// Field holding the unemployment percentage. Never a crime category.
pub const UNEMPLOYMENT_RATE_FIELD: &str = "Unemployment_Rate";

/// A data year as stored in the `data_year` column.
pub type DataYear = i32;

/// Converts a numeric year to a [`DataYear`].
///
/// Integral floats (`2019.0`) are accepted. Fractional, non-finite and out
/// of range values are not.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_year(value: f64) -> Option<DataYear> {
    let in_range = (f64::from(DataYear::MIN)..=f64::from(DataYear::MAX)).contains(&value);
    (value.is_finite() && value.fract() == 0.0 && in_range).then(|| value as DataYear)
}

fn deserialize_year<'de, D>(deserializer: D) -> Result<DataYear, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_i64()
        .and_then(|year| DataYear::try_from(year).ok())
        .or_else(|| number.as_f64().and_then(coerce_year))
        .ok_or_else(|| de::Error::custom(format!("data_year {number} is not an integer year")))
}

/// Error returned when a field name cannot be used as a crime category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCategoryError {
    /// The field does not end in [`RATE_SUFFIX`].
    #[error("'{key}' is not a rate field (expected a '{RATE_SUFFIX}' suffix)")]
    NotARate {
        /// The rejected field name.
        key: String,
    },
    /// The field is the unemployment column.
    #[error("'{UNEMPLOYMENT_RATE_FIELD}' is not a crime category")]
    Unemployment,
}

/// Name of a selectable crime rate column (e.g. `"Violent_rate"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    /// Validates `key` as a crime category field name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCategoryError`] if `key` is the unemployment column
    /// or does not end in [`RATE_SUFFIX`].
    pub fn parse(key: &str) -> Result<Self, InvalidCategoryError> {
        if key == UNEMPLOYMENT_RATE_FIELD {
            return Err(InvalidCategoryError::Unemployment);
        }
        if !key.ends_with(RATE_SUFFIX) {
            return Err(InvalidCategoryError::NotARate {
                key: key.to_string(),
            });
        }
        Ok(Self(key.to_string()))
    }

    /// Returns `true` if a record field with this name is a crime category.
    #[must_use]
    pub fn is_category_field(name: &str) -> bool {
        name != UNEMPLOYMENT_RATE_FIELD && name.ends_with(RATE_SUFFIX)
    }

    /// Returns the raw field name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label shown to users: the key without its `_rate` suffix.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.0.strip_suffix(RATE_SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the statistics dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    /// State join key as published (usually a USPS abbreviation).
    pub state_abbr: String,
    /// Observation year. Integral floats such as `2019.0` are accepted.
    #[serde(deserialize_with = "deserialize_year")]
    pub data_year: DataYear,
    /// Resident population.
    #[serde(rename = "Population", default)]
    pub population: Option<f64>,
    /// Unemployment as a percentage value (5.3 means 5.3%).
    #[serde(rename = "Unemployment_Rate", default)]
    pub unemployment_rate: Option<f64>,
    /// Every other column, rate fields included, in payload order.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl StatRecord {
    /// Returns the value of the given rate column.
    ///
    /// `null`, non-numeric and non-finite values count as undefined.
    #[must_use]
    pub fn rate(&self, category: &CategoryKey) -> Option<f64> {
        self.fields
            .get(category.as_str())
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// Names of every crime rate column on this record, in payload order.
    pub fn rate_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|name| CategoryKey::is_category_field(name))
    }
}
