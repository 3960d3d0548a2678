#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the bubble map server.
//!
//! These types are serialized to JSON for the REST API consumed by the
//! browser-side map widget. They are separate from the render types to
//! allow independent evolution of the API contract.

use bubble_map_config::MapViewConfig;
use bubble_map_loader::Dataset;
use bubble_map_render::{MarkerLayer, RawSelection, RenderOutcome};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Initial map view and base tile layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMapView {
    /// `[latitude, longitude]` of the initial center.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
    /// Tile URL template.
    pub tile_url: String,
    /// Tile attribution.
    pub attribution: String,
}

impl From<&MapViewConfig> for ApiMapView {
    fn from(config: &MapViewConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            tile_url: config.tile_url.clone(),
            attribution: config.attribution.clone(),
        }
    }
}

/// One entry of the crime category selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategoryOption {
    /// Value sent back in a selection (e.g. `"Violent_rate"`).
    pub key: String,
    /// Label shown to the user (e.g. `"Violent"`).
    pub label: String,
}

/// Everything needed to populate the selection controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// Crime categories, in dataset order.
    pub categories: Vec<ApiCategoryOption>,
    /// Distinct years, ascending.
    pub years: Vec<i32>,
}

impl From<&Dataset> for ApiOptions {
    fn from(dataset: &Dataset) -> Self {
        Self {
            categories: dataset
                .categories()
                .iter()
                .map(|key| ApiCategoryOption {
                    key: key.to_string(),
                    label: key.display_name().to_string(),
                })
                .collect(),
            years: dataset.years().to_vec(),
        }
    }
}

/// Body of `PUT /api/selection`.
///
/// `year` may be sent as a JSON string or number.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSelectionRequest {
    /// Selected category key.
    #[serde(default)]
    pub category: Option<String>,
    /// Selected year.
    #[serde(default)]
    pub year: Option<serde_json::Value>,
}

impl From<ApiSelectionRequest> for RawSelection {
    fn from(req: ApiSelectionRequest) -> Self {
        let year = req.year.and_then(|year| match year {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        Self {
            category: req.category,
            year,
        }
    }
}

/// Response of `PUT /api/selection`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSelectionResponse {
    /// Outcome kind (`drawn`, `selection_incomplete`, `invalid_selection`,
    /// `no_matching_data`, `failed`).
    pub status: &'static str,
    /// Markers drawn by this render (0 for no-ops).
    pub drawn: usize,
    /// State codes skipped for missing geometry.
    pub skipped: Vec<String>,
    /// Warning or error text for non-drawn outcomes.
    pub message: Option<String>,
    /// Marker layer after the render.
    pub markers: geojson::FeatureCollection,
}

impl ApiSelectionResponse {
    /// Builds the response from a render outcome and the resulting layer.
    #[must_use]
    pub fn new(outcome: &RenderOutcome, layer: &MarkerLayer) -> Self {
        let (drawn, skipped, message) = match outcome {
            RenderOutcome::Drawn { drawn, skipped } => (
                *drawn,
                skipped.iter().map(ToString::to_string).collect(),
                None,
            ),
            RenderOutcome::SelectionIncomplete => (
                0,
                Vec::new(),
                Some("Please select both crime type and year.".to_string()),
            ),
            RenderOutcome::InvalidSelection { message } | RenderOutcome::Failed { message } => {
                (0, Vec::new(), Some(message.clone()))
            }
            RenderOutcome::NoMatchingData => (
                0,
                Vec::new(),
                Some("No data found for the selected crime and year.".to_string()),
            ),
        };

        Self {
            status: outcome.kind(),
            drawn,
            skipped,
            message,
            markers: layer.to_feature_collection(),
        }
    }
}
