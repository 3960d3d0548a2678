#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Selection rendering for the bubble map.
//!
//! Given a loaded [`Dataset`] and the user's category/year selection, the
//! renderer filters the statistics, joins each surviving record to its
//! state's point, computes the relative encoding (radius from population,
//! color alpha from the value divided by the selection maximum), and
//! redraws a [`MapSurface`].
//!
//! Every problem a render can hit is contained in its [`RenderOutcome`]:
//! incomplete or invalid selections and empty filters leave the surface
//! untouched, and surface failures leave it empty rather than half drawn.

pub mod encode;
pub mod popup;
pub mod selection;
pub mod session;
pub mod surface;

use bubble_map_geography_models::{StateCode, fips};
use bubble_map_loader::Dataset;
use serde::Serialize;

pub use encode::{Encoding, MarkerStyle};
pub use selection::{RawSelection, Selection, SelectionError};
pub use session::MapSession;
pub use surface::{MapSurface, Marker, MarkerLayer, SurfaceError};

/// A statistics record matched to its state's location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedPoint {
    /// Marker latitude.
    pub latitude: f64,
    /// Marker longitude.
    pub longitude: f64,
    /// Normalized state code.
    pub state_abbr: StateCode,
    /// Human-readable state name.
    pub name: String,
    /// Value of the selected category.
    pub value: f64,
    /// Resident population.
    pub population: Option<f64>,
    /// Unemployment percentage.
    pub unemployment_rate: Option<f64>,
}

/// Markers computed for one selection, before anything is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// The selection this plan encodes.
    pub selection: Selection,
    /// Largest selected value among the filtered records.
    pub max_value: f64,
    /// Markers to draw, in record order.
    pub markers: Vec<Marker>,
    /// States of filtered records that had no geometry.
    pub skipped: Vec<StateCode>,
}

/// Result of one render cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The surface now shows exactly these markers.
    Drawn {
        /// Number of markers drawn.
        drawn: usize,
        /// States skipped for missing geometry.
        skipped: Vec<StateCode>,
    },
    /// Category or year was not selected. Surface untouched.
    SelectionIncomplete,
    /// Selection values could not be used. Surface untouched.
    InvalidSelection {
        /// Why the selection was rejected.
        message: String,
    },
    /// No record matched the selection. Surface untouched.
    NoMatchingData,
    /// The surface failed mid-render and was cleared.
    Failed {
        /// The surface error.
        message: String,
    },
}

impl RenderOutcome {
    /// Short machine-readable name of the outcome.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Drawn { .. } => "drawn",
            Self::SelectionIncomplete => "selection_incomplete",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::NoMatchingData => "no_matching_data",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Computes the markers for a selection without touching any surface.
///
/// Returns `None` when no record has a defined value for the selected
/// category in the selected year.
#[must_use]
pub fn plan(dataset: &Dataset, selection: &Selection, encoding: &Encoding) -> Option<RenderPlan> {
    let filtered: Vec<_> = dataset
        .records()
        .iter()
        .filter(|record| record.data_year == selection.year)
        .filter_map(|record| {
            record
                .rate(&selection.category)
                .map(|value| (record, value))
        })
        .collect();

    if filtered.is_empty() {
        return None;
    }

    let max_value = filtered
        .iter()
        .map(|(_, value)| *value)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut markers = Vec::with_capacity(filtered.len());
    let mut skipped = Vec::new();

    for (record, value) in filtered {
        let code = StateCode::normalize(&record.state_abbr);

        let Some(location) = dataset.location(&code) else {
            log::warn!(
                "Skipping {} {}: no geometry for state code {code}",
                record.state_abbr,
                record.data_year
            );
            skipped.push(code);
            continue;
        };

        let name = dataset
            .name_lookup()
            .get(&code)
            .or_else(|| fips::name_for_abbr(code.as_str()))
            .map_or_else(|| code.to_string(), ToString::to_string);

        let point = JoinedPoint {
            latitude: location.latitude,
            longitude: location.longitude,
            state_abbr: code,
            name,
            value,
            population: record.population,
            unemployment_rate: record.unemployment_rate,
        };
        let style = encoding.style(value, max_value, record.population);
        let popup = popup::popup_html(&point, &selection.category);

        markers.push(Marker {
            point,
            style,
            popup,
        });
    }

    Some(RenderPlan {
        selection: selection.clone(),
        max_value,
        markers,
        skipped,
    })
}

/// Renders a selection onto a surface.
///
/// The full marker set is computed first; only then are the previous
/// markers cleared and the new ones drawn. If the surface fails part-way it
/// is cleared again so it never shows a mix of old and new markers.
pub fn render<S: MapSurface + ?Sized>(
    dataset: &Dataset,
    raw: &RawSelection,
    surface: &mut S,
    encoding: &Encoding,
) -> RenderOutcome {
    let selection = match Selection::parse(raw)
        .and_then(|selection| selection.ensure_known(dataset.categories()))
    {
        Ok(selection) => selection,
        Err(SelectionError::Incomplete) => {
            log::warn!("{}", SelectionError::Incomplete);
            return RenderOutcome::SelectionIncomplete;
        }
        Err(e) => {
            log::warn!("{e}");
            return RenderOutcome::InvalidSelection {
                message: e.to_string(),
            };
        }
    };

    let Some(plan) = plan(dataset, &selection, encoding) else {
        log::warn!("No data found for the selected crime and year ({selection})");
        return RenderOutcome::NoMatchingData;
    };

    log::debug!(
        "Rendering {selection}: {} markers, {} skipped, max value {}",
        plan.markers.len(),
        plan.skipped.len(),
        plan.max_value
    );

    if let Err(e) = draw(&plan, surface) {
        log::error!("Error drawing markers for {selection}: {e}");
        if let Err(e) = surface.clear_markers() {
            log::error!("Failed to clear markers after a failed render: {e}");
        }
        return RenderOutcome::Failed {
            message: e.to_string(),
        };
    }

    RenderOutcome::Drawn {
        drawn: plan.markers.len(),
        skipped: plan.skipped,
    }
}

fn draw<S: MapSurface + ?Sized>(plan: &RenderPlan, surface: &mut S) -> Result<(), SurfaceError> {
    surface.clear_markers()?;
    for marker in &plan.markers {
        surface.draw_marker(&marker.point, &marker.style, &marker.popup)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bubble_map_loader::CategorySchema;

    use super::*;

    const STATS: &str = r#"[
        {"state_abbr": "CA", "data_year": 2019, "Population": 39500000,
         "Unemployment_Rate": 4.2, "Violent_rate": 450, "Property_rate": 2300},
        {"state_abbr": "NY", "data_year": 2019, "Population": 19500000,
         "Unemployment_Rate": 3.9, "Violent_rate": 360, "Property_rate": 1500},
        {"state_abbr": "TX", "data_year": 2019, "Population": 29000000,
         "Unemployment_Rate": 3.5, "Violent_rate": 420, "Property_rate": null},
        {"state_abbr": "ZZ", "data_year": 2019, "Population": 1000,
         "Unemployment_Rate": 1.0, "Violent_rate": 10, "Property_rate": 10},
        {"state_abbr": "CA", "data_year": 2020, "Population": 39400000,
         "Unemployment_Rate": 10.1, "Violent_rate": 440, "Property_rate": 2100},
        {"state_abbr": "NY", "data_year": 2021, "Population": 19400000,
         "Unemployment_Rate": 7.0, "Violent_rate": 0, "Property_rate": 0}
    ]"#;

    const GEO: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"STATE": "06", "NAME": "California"},
         "geometry": {"type": "Point", "coordinates": [-119.4, 36.7]}},
        {"type": "Feature", "properties": {"STATE": "36", "NAME": "New York"},
         "geometry": {"type": "Point", "coordinates": [-75.5, 42.9]}},
        {"type": "Feature", "properties": {"STATE": "48", "NAME": "Texas"},
         "geometry": {"type": "Point", "coordinates": [-99.3, 31.5]}}
    ]}"#;

    fn dataset() -> Dataset {
        Dataset::from_bodies(STATS, GEO, &CategorySchema::Inferred).unwrap()
    }

    fn codes(layer: &MarkerLayer) -> Vec<&str> {
        layer
            .markers()
            .iter()
            .map(|m| m.point.state_abbr.as_str())
            .collect()
    }

    /// A surface that fails after a fixed number of draws.
    struct FlakySurface {
        inner: MarkerLayer,
        draws_left: usize,
    }

    impl MapSurface for FlakySurface {
        fn clear_markers(&mut self) -> Result<(), SurfaceError> {
            self.inner.clear_markers()
        }

        fn draw_marker(
            &mut self,
            point: &JoinedPoint,
            style: &MarkerStyle,
            popup: &str,
        ) -> Result<(), SurfaceError> {
            if self.draws_left == 0 {
                return Err(SurfaceError {
                    message: "widget detached".to_string(),
                });
            }
            self.draws_left -= 1;
            self.inner.draw_marker(point, style, popup)
        }
    }

    #[test]
    fn california_example() {
        let dataset = dataset();
        let mut layer = MarkerLayer::new();

        let outcome = render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );

        let ca = &layer.markers()[0];
        assert!((ca.point.latitude - 36.7).abs() < f64::EPSILON);
        assert!((ca.point.longitude - -119.4).abs() < f64::EPSILON);
        assert_eq!(ca.point.name, "California");
        assert!((ca.style.radius - 50.279).abs() < 1e-2);
        assert!((ca.style.score - 1.0).abs() < f64::EPSILON);
        assert!(ca.popup.contains("California"));
        assert!(ca.popup.contains("Violent Rate: 450.00"));
        assert!(ca.popup.contains("Unemployment Rate: 4.20%"));

        assert_eq!(
            outcome,
            RenderOutcome::Drawn {
                drawn: 3,
                skipped: vec![StateCode::normalize("ZZ")],
            }
        );
    }

    #[test]
    fn one_marker_per_record_with_geometry() {
        let dataset = dataset();
        let mut layer = MarkerLayer::new();

        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );

        assert_eq!(codes(&layer), vec!["CA", "NY", "TX"]);
    }

    #[test]
    fn undefined_rates_are_filtered_out() {
        let dataset = dataset();
        let mut layer = MarkerLayer::new();

        render(
            &dataset,
            &RawSelection::new("Property_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );

        assert_eq!(codes(&layer), vec!["CA", "NY"]);
    }

    #[test]
    fn scores_are_normalized_to_selection_max() {
        let dataset = dataset();
        let selection = Selection::parse(&RawSelection::new("Violent_rate", "2019")).unwrap();
        let plan = plan(&dataset, &selection, &Encoding::default()).unwrap();

        assert!((plan.max_value - 450.0).abs() < f64::EPSILON);
        for marker in &plan.markers {
            assert!((0.0..=1.0).contains(&marker.style.score));
        }
        let ny = &plan.markers[1];
        assert!((ny.style.score - 0.8).abs() < 1e-12);
        assert_eq!(ny.style.color.to_string(), format!("rgba(0, 0, 255, {})", ny.style.score));
    }

    #[test]
    fn max_includes_records_without_geometry() {
        let stats = r#"[
            {"state_abbr": "CA", "data_year": 2019, "Population": 1, "Violent_rate": 100},
            {"state_abbr": "ZZ", "data_year": 2019, "Population": 1, "Violent_rate": 200}
        ]"#;
        let dataset = Dataset::from_bodies(stats, GEO, &CategorySchema::Inferred).unwrap();
        let selection = Selection::parse(&RawSelection::new("Violent_rate", "2019")).unwrap();
        let plan = plan(&dataset, &selection, &Encoding::default()).unwrap();

        assert!((plan.max_value - 200.0).abs() < f64::EPSILON);
        assert!((plan.markers[0].style.score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_max_scores_zero() {
        let dataset = dataset();
        let mut layer = MarkerLayer::new();

        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2021"),
            &mut layer,
            &Encoding::default(),
        );

        assert_eq!(layer.len(), 1);
        assert!(layer.markers()[0].style.score.abs() < f64::EPSILON);
        assert_eq!(
            layer.markers()[0].style.color.to_string(),
            "rgba(0, 0, 255, 0)"
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let dataset = dataset();
        let raw = RawSelection::new("Violent_rate", "2019");
        let mut layer = MarkerLayer::new();

        render(&dataset, &raw, &mut layer, &Encoding::default());
        let first = layer.clone();
        render(&dataset, &raw, &mut layer, &Encoding::default());

        assert_eq!(layer, first);
        assert_eq!(layer.len(), 3);
    }

    #[test]
    fn changing_year_replaces_markers() {
        let dataset = dataset();
        let mut layer = MarkerLayer::new();

        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );
        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2020"),
            &mut layer,
            &Encoding::default(),
        );

        assert_eq!(codes(&layer), vec!["CA"]);
        assert!((layer.markers()[0].point.value - 440.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_matching_data_leaves_layer_unchanged() {
        let dataset = dataset();
        let mut layer = MarkerLayer::new();
        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );
        let before = layer.clone();

        let outcome = render(
            &dataset,
            &RawSelection::new("Violent_rate", "1999"),
            &mut layer,
            &Encoding::default(),
        );
        assert_eq!(outcome, RenderOutcome::NoMatchingData);
        assert_eq!(layer, before);

        let outcome = render(
            &dataset,
            &RawSelection::new("Arson_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );
        assert_eq!(outcome.kind(), "invalid_selection");
        assert_eq!(layer, before);
    }

    #[test]
    fn declared_schema_limits_selectable_categories() {
        let dataset = Dataset::from_bodies(
            STATS,
            GEO,
            &CategorySchema::Declared(vec!["Property_rate".to_string()]),
        )
        .unwrap();
        let mut layer = MarkerLayer::new();

        let outcome = render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );
        assert!(matches!(
            outcome,
            RenderOutcome::InvalidSelection { ref message } if message.contains("Violent_rate")
        ));
        assert!(layer.is_empty());

        let outcome = render(
            &dataset,
            &RawSelection::new("Property_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );
        assert_eq!(outcome.kind(), "drawn");
        assert_eq!(codes(&layer), vec!["CA", "NY"]);
    }

    #[test]
    fn incomplete_and_invalid_selections_are_no_ops() {
        let dataset = dataset();
        let mut layer = MarkerLayer::new();
        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut layer,
            &Encoding::default(),
        );
        let before = layer.clone();

        let incomplete = RawSelection {
            category: Some("Violent_rate".to_string()),
            year: None,
        };
        assert_eq!(
            render(&dataset, &incomplete, &mut layer, &Encoding::default()),
            RenderOutcome::SelectionIncomplete
        );

        let outcome = render(
            &dataset,
            &RawSelection::new("Violent_rate", "next year"),
            &mut layer,
            &Encoding::default(),
        );
        assert_eq!(outcome.kind(), "invalid_selection");
        assert_eq!(layer, before);
    }

    #[test]
    fn surface_failure_leaves_surface_empty() {
        let dataset = dataset();
        let mut surface = FlakySurface {
            inner: MarkerLayer::new(),
            draws_left: 3,
        };

        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut surface,
            &Encoding::default(),
        );
        assert_eq!(surface.inner.len(), 3);

        surface.draws_left = 1;
        let outcome = render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut surface,
            &Encoding::default(),
        );

        assert!(matches!(outcome, RenderOutcome::Failed { .. }));
        assert!(surface.inner.is_empty());
    }

    #[test]
    fn render_never_mutates_dataset() {
        let dataset = dataset();
        let records_before = dataset.records().to_vec();
        let mut surface = FlakySurface {
            inner: MarkerLayer::new(),
            draws_left: 0,
        };

        render(
            &dataset,
            &RawSelection::new("Violent_rate", "2019"),
            &mut surface,
            &Encoding::default(),
        );

        assert_eq!(dataset.records(), records_before.as_slice());
    }
}
