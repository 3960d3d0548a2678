#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the bubble map.
//!
//! Every setting has a default, so an empty (or absent) TOML file is a
//! valid configuration. A file is picked from `--config` or the
//! `BUBBLE_MAP_CONFIG` environment variable, then a handful of environment
//! variables override individual fields:
//!
//! | Variable | Field |
//! |---|---|
//! | `BUBBLE_MAP_STATS` | `data.stats` |
//! | `BUBBLE_MAP_GEO` | `data.geo` |
//! | `BIND_ADDR` | `server.bind_addr` |
//! | `PORT` | `server.port` |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "BUBBLE_MAP_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// An override variable holds an unusable value.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset locations and schema.
    pub data: DataConfig,
    /// Marker encoding constants.
    pub render: RenderConfig,
    /// Initial map view handed to the map widget.
    pub map: MapViewConfig,
    /// HTTP listener.
    pub server: ServerConfig,
}

/// Where the two datasets live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Statistics dataset URL or file path.
    pub stats: String,
    /// `GeoJSON` dataset URL or file path.
    pub geo: String,
    /// Declared crime category keys. When absent the categories are
    /// inferred from the first statistics record.
    pub categories: Option<Vec<String>>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            stats: "../Visualizations/Data/data_with_coordinates.json".to_string(),
            geo: "../Visualizations/Data/us-states.json".to_string(),
            categories: None,
        }
    }
}

/// Constants for the marker visual encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Radius multiplier applied to `sqrt(population)`.
    pub scale_factor: f64,
    /// Fill opacity of every marker, independent of score.
    pub fill_opacity: f64,
    /// Base RGB color; its alpha channel carries the score.
    pub color: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale_factor: 0.008,
            fill_opacity: 0.5,
            color: [0, 0, 255],
        }
    }
}

/// Initial view and base tile layer for the map widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    /// `[latitude, longitude]` of the initial center.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
    /// Tile URL template.
    pub tile_url: String,
    /// Attribution shown for the tile layer.
    pub attribution: String,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            center: [37.8, -96.0],
            zoom: 4,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads the effective configuration.
    ///
    /// Uses `path` if given, else the file named by [`CONFIG_ENV`], else
    /// defaults; then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be loaded or an override
    /// variable is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                log::debug!("No config file given, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `PORT` is not a valid port.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(stats) = lookup("BUBBLE_MAP_STATS") {
            self.data.stats = stats;
        }
        if let Some(geo) = lookup("BUBBLE_MAP_GEO") {
            self.data.geo = geo;
        }
        if let Some(bind_addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: port,
            })?;
        }
        Ok(())
    }
}
