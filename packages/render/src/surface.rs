//! The boundary between the renderer and whatever displays the map.
//!
//! A map widget only has to clear its point markers and draw new ones.
//! [`MarkerLayer`] is the in-memory implementation used by the server and
//! the CLI; it can be exported as a `GeoJSON` `FeatureCollection` for a
//! browser-side widget to draw.

use serde::Serialize;
use thiserror::Error;

use crate::JoinedPoint;
use crate::encode::MarkerStyle;

/// A map surface rejected a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Map surface error: {message}")]
pub struct SurfaceError {
    /// Description of what went wrong.
    pub message: String,
}

/// Point-marker operations a map widget must support.
///
/// `clear_markers` removes only point markers. Base tiles and any other
/// layers belong to the widget and must be left alone.
pub trait MapSurface {
    /// Removes every previously drawn point marker.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the surface cannot be cleared.
    fn clear_markers(&mut self) -> Result<(), SurfaceError>;

    /// Draws one circle marker with an on-demand popup.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the marker cannot be drawn.
    fn draw_marker(
        &mut self,
        point: &JoinedPoint,
        style: &MarkerStyle,
        popup: &str,
    ) -> Result<(), SurfaceError>;
}

/// A computed marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Joined data behind the marker.
    pub point: JoinedPoint,
    /// Visual encoding.
    pub style: MarkerStyle,
    /// Popup HTML, shown on interaction.
    pub popup: String,
}

/// In-memory marker layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
}

impl MarkerLayer {
    /// An empty layer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    /// Markers currently drawn, in draw order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Number of markers currently drawn.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether no markers are drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Exports the layer as a `GeoJSON` `FeatureCollection`.
    ///
    /// Each marker becomes a `Point` feature whose properties carry the
    /// joined values, the style (`radius`, `color`, `fillColor`,
    /// `fillOpacity`, `score`) and the `popup` HTML.
    #[must_use]
    pub fn to_feature_collection(&self) -> geojson::FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|marker| {
                let properties = serde_json::json!({
                    "stateAbbr": marker.point.state_abbr,
                    "name": marker.point.name,
                    "value": marker.point.value,
                    "population": marker.point.population,
                    "unemploymentRate": marker.point.unemployment_rate,
                    "score": marker.style.score,
                    "radius": marker.style.radius,
                    "color": marker.style.color,
                    "fillColor": marker.style.fill_color,
                    "fillOpacity": marker.style.fill_opacity,
                    "popup": marker.popup,
                });

                geojson::Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                        marker.point.longitude,
                        marker.point.latitude,
                    ]))),
                    id: None,
                    properties: properties.as_object().cloned(),
                    foreign_members: None,
                }
            })
            .collect();

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

impl MapSurface for MarkerLayer {
    fn clear_markers(&mut self) -> Result<(), SurfaceError> {
        self.markers.clear();
        Ok(())
    }

    fn draw_marker(
        &mut self,
        point: &JoinedPoint,
        style: &MarkerStyle,
        popup: &str,
    ) -> Result<(), SurfaceError> {
        self.markers.push(Marker {
            point: point.clone(),
            style: *style,
            popup: popup.to_string(),
        });
        Ok(())
    }
}
