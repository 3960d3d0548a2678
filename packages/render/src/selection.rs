//! Validation of the user's filter selection.
//!
//! Selection values arrive as strings (dropdown values, query parameters,
//! CLI flags). They are checked and converted here so the renderer only
//! ever compares typed values.

use std::fmt;

use bubble_map_stats_models::{CategoryKey, DataYear, coerce_year};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selection exactly as received from the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSelection {
    /// Selected category key (e.g. `"Violent_rate"`).
    pub category: Option<String>,
    /// Selected year, still as text.
    pub year: Option<String>,
}

impl RawSelection {
    /// Convenience constructor for a fully populated selection.
    #[must_use]
    pub fn new(category: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            year: Some(year.into()),
        }
    }
}

/// A validated selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Category to encode.
    pub category: CategoryKey,
    /// Year to filter on.
    pub year: DataYear,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.category, self.year)
    }
}

/// Why a raw selection could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Category or year missing or blank.
    #[error("Please select both crime type and year.")]
    Incomplete,

    /// Year is not an integral number.
    #[error("Selected year {0:?} is not a number")]
    InvalidYear(String),

    /// Category is a rate field name but not one of the dataset's
    /// categories.
    #[error("Selected category '{0}' is not available")]
    UnknownCategory(CategoryKey),

    /// Category is not a rate field name.
    #[error("Selected category is invalid: {0}")]
    InvalidCategory(#[from] bubble_map_stats_models::InvalidCategoryError),
}

impl Selection {
    /// Validates a raw selection.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Incomplete`] if either value is missing or
    /// blank, [`SelectionError::InvalidYear`] if the year is not an integer
    /// and [`SelectionError::InvalidCategory`] if the category is not a
    /// rate field name.
    pub fn parse(raw: &RawSelection) -> Result<Self, SelectionError> {
        let category = non_blank(raw.category.as_deref());
        let year = non_blank(raw.year.as_deref());

        let (Some(category), Some(year)) = (category, year) else {
            return Err(SelectionError::Incomplete);
        };

        let year = year
            .parse::<f64>()
            .ok()
            .and_then(coerce_year)
            .ok_or_else(|| SelectionError::InvalidYear(year.to_string()))?;
        let category = CategoryKey::parse(category)?;

        Ok(Self { category, year })
    }

    /// Checks the category against the categories fixed at load time.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownCategory`] if `categories` does not
    /// contain the selected category.
    pub fn ensure_known(self, categories: &[CategoryKey]) -> Result<Self, SelectionError> {
        if categories.contains(&self.category) {
            Ok(self)
        } else {
            Err(SelectionError::UnknownCategory(self.category))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
