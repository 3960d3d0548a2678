//! Relative visual encoding of a selected value.
//!
//! Each marker's radius follows the square root of the state's population
//! and its color alpha follows the score: the value divided by the largest
//! value in the current selection.

use std::fmt;

use bubble_map_config::RenderConfig;
use serde::{Serialize, Serializer};

/// An opaque base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Attaches an alpha channel.
    #[must_use]
    pub const fn with_alpha(self, a: f64) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

/// A translucent color, rendered as a CSS `rgba()` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha in `[0, 1]`.
    pub a: f64,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Style of a single circle marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    /// Normalized value in `[0, 1]`.
    pub score: f64,
    /// Circle radius in pixels.
    pub radius: f64,
    /// Stroke color.
    pub color: Rgba,
    /// Fill color.
    pub fill_color: Rgba,
    /// Fill opacity, independent of the score.
    pub fill_opacity: f64,
}

/// Encoding constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoding {
    /// Radius multiplier applied to `sqrt(population)`.
    pub scale_factor: f64,
    /// Fill opacity of every marker.
    pub fill_opacity: f64,
    /// Base color; the score becomes its alpha.
    pub color: Rgb,
}

impl Default for Encoding {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for Encoding {
    fn from(config: &RenderConfig) -> Self {
        let [r, g, b] = config.color;
        Self {
            scale_factor: config.scale_factor,
            fill_opacity: config.fill_opacity,
            color: Rgb { r, g, b },
        }
    }
}

impl Encoding {
    /// Circle radius for a population. Missing, negative and non-finite
    /// populations give a zero radius.
    #[must_use]
    pub fn radius(&self, population: Option<f64>) -> f64 {
        population
            .filter(|p| p.is_finite() && *p > 0.0)
            .map_or(0.0, |p| p.sqrt() * self.scale_factor)
    }

    /// Full marker style for one value.
    #[must_use]
    pub fn style(&self, value: f64, max_value: f64, population: Option<f64>) -> MarkerStyle {
        let score = score(value, max_value);
        let color = self.color.with_alpha(score);
        MarkerStyle {
            score,
            radius: self.radius(population),
            color,
            fill_color: color,
            fill_opacity: self.fill_opacity,
        }
    }
}

/// `value / max_value` clamped to `[0, 1]`.
///
/// A zero, negative or non-finite maximum yields `0` so no `NaN` reaches
/// the color encoding.
#[must_use]
pub fn score(value: f64, max_value: f64) -> f64 {
    if !(max_value.is_finite() && max_value > 0.0) {
        return 0.0;
    }
    let score = value / max_value;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
