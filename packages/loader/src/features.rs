//! Parses the state geometry `FeatureCollection` into [`GeoFeature`]s.
//!
//! Each feature contributes `properties.STATE`, `properties.NAME` and a
//! representative point. `Point` geometries are used verbatim; polygon
//! boundaries (e.g. a `us-states.json` outline file) are reduced to their
//! centroid.

use bubble_map_geography_models::{GeoFeature, GeoPoint, StateCode, fips};
use geo::Centroid;
use geojson::GeoJson;

use crate::{DatasetKind, LoadError};

/// Parses a `GeoJSON` body into features.
///
/// Features without a usable `STATE` property are skipped with a warning.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] if the body is not a `GeoJSON`
/// `FeatureCollection`.
pub fn parse_features(body: &str) -> Result<Vec<GeoFeature>, LoadError> {
    let geojson: GeoJson = body.parse().map_err(|e| LoadError::Parse {
        dataset: DatasetKind::Geo,
        message: format!("{e}"),
    })?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(LoadError::Parse {
            dataset: DatasetKind::Geo,
            message: "expected a FeatureCollection".to_string(),
        });
    };

    Ok(collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let parsed = parse_feature(feature);
            if parsed.is_none() {
                log::warn!("Skipping geography feature {index}: no STATE property");
            }
            parsed
        })
        .collect())
}

fn parse_feature(feature: &geojson::Feature) -> Option<GeoFeature> {
    let raw_code = match feature.property("STATE")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let code = StateCode::normalize(&raw_code);

    let name = feature
        .property("NAME")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(|| fips::name_for_abbr(code.as_str()).map(ToString::to_string))
        .unwrap_or_else(|| code.to_string());

    let location = feature.geometry.as_ref().and_then(representative_point);
    if location.is_none() {
        log::debug!("Feature {code} ({name}) has no usable geometry");
    }

    Some(GeoFeature {
        code,
        raw_code,
        name,
        location,
    })
}

/// Point geometries as-is, anything else by centroid.
fn representative_point(geometry: &geojson::Geometry) -> Option<GeoPoint> {
    if let geojson::Value::Point(coords) = &geometry.value {
        return match coords.as_slice() {
            [longitude, latitude, ..] if longitude.is_finite() && latitude.is_finite() => {
                Some(GeoPoint {
                    longitude: *longitude,
                    latitude: *latitude,
                })
            }
            _ => None,
        };
    }

    let geometry: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    let centroid = geometry.centroid()?;
    Some(GeoPoint {
        longitude: centroid.x(),
        latitude: centroid.y(),
    })
}
