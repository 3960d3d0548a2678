#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset loading and joining.
//!
//! Fetches the per-state statistics table and the state geometry
//! `FeatureCollection` concurrently, validates both, and produces an
//! immutable [`Dataset`] snapshot: raw records, normalized features, the
//! state name lookup, a geometry index keyed by the shared state code, and
//! the selectable category and year lists.
//!
//! Loading is all-or-nothing. Any failure is returned as a [`LoadError`]
//! and nothing is retried.

pub mod dataset;
pub mod features;
pub mod source;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use dataset::{CategorySchema, Dataset};
pub use source::DataSource;

/// Which of the two input datasets an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// The per-state statistics table.
    Stats,
    /// The state geometry `FeatureCollection`.
    Geo,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stats => "statistics",
            Self::Geo => "geography",
        })
    }
}

/// Errors that can occur while loading the datasets.
#[derive(Debug, Error)]
pub enum LoadError {
    /// At least one source answered with a non-success status.
    #[error("HTTP error! Status: {stats_status} (statistics) or {geo_status} (geography)")]
    Http {
        /// Status of the statistics fetch.
        stats_status: u16,
        /// Status of the geography fetch.
        geo_status: u16,
    },

    /// The request could not be sent or its body could not be read.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A file source could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A body is not valid JSON (or not valid `GeoJSON`).
    #[error("Failed to parse {dataset} dataset: {message}")]
    Parse {
        /// Dataset whose body failed to parse.
        dataset: DatasetKind,
        /// Parser message.
        message: String,
    },

    /// The statistics payload is not a non-empty array of records.
    #[error("Invalid statistics data: {message}")]
    Shape {
        /// Description of what went wrong.
        message: String,
    },

    /// A declared category list does not fit the data.
    #[error("Invalid category schema: {message}")]
    Schema {
        /// Description of what went wrong.
        message: String,
    },
}

/// Loads both datasets concurrently and joins them.
///
/// Both fetches must finish before anything is validated. If either one
/// returns a non-success status the load fails with [`LoadError::Http`]
/// carrying both status codes.
///
/// # Errors
///
/// Returns [`LoadError`] if either fetch fails, either body cannot be
/// parsed, or the statistics payload has the wrong shape.
pub async fn load(
    client: &reqwest::Client,
    stats: &DataSource,
    geo: &DataSource,
    schema: &CategorySchema,
) -> Result<Dataset, LoadError> {
    log::info!("Loading statistics from {stats} and geography from {geo}...");

    let (stats_response, geo_response) =
        tokio::join!(source::fetch(client, stats), source::fetch(client, geo));
    let stats_response = stats_response?;
    let geo_response = geo_response?;

    ensure_success(stats_response.status, geo_response.status)?;

    let dataset = Dataset::from_bodies(&stats_response.body, &geo_response.body, schema)?;

    log::info!(
        "Loaded {} records ({} categories, {} years) and {} state features",
        dataset.records().len(),
        dataset.categories().len(),
        dataset.years().len(),
        dataset.features().len(),
    );

    Ok(dataset)
}

/// Fails unless both statuses are 2xx.
fn ensure_success(stats_status: u16, geo_status: u16) -> Result<(), LoadError> {
    let ok = |status: u16| (200..300).contains(&status);
    if ok(stats_status) && ok(geo_status) {
        Ok(())
    } else {
        Err(LoadError::Http {
            stats_status,
            geo_status,
        })
    }
}
