//! Configuration type definitions.

use crate::constants::{map, model};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
///
/// Paths left unset are resolved against the platform data directory by
/// [`Config::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detection model settings.
    pub model: ModelConfig,

    /// Database and archive locations.
    pub storage: StorageConfig,

    /// Map rendering settings.
    pub map: MapConfig,

    /// Annotated preview settings.
    pub preview: PreviewConfig,
}

/// Detection model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX weights.
    pub path: Option<PathBuf>,

    /// Square network input size in pixels.
    pub input_size: u32,

    /// Minimum class score for a box to be reported.
    pub min_confidence: f32,

    /// IoU threshold for non-maximum suppression.
    pub iou_threshold: f32,

    /// Class names indexed by class id.
    pub class_names: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            input_size: model::DEFAULT_INPUT_SIZE,
            min_confidence: model::DEFAULT_MIN_CONFIDENCE,
            iou_threshold: model::DEFAULT_IOU_THRESHOLD,
            class_names: vec![model::DEFAULT_CLASS_NAME.to_string()],
        }
    }
}

/// Database and archive locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` database file.
    pub database: Option<PathBuf>,

    /// Directory that receives archived sighting images.
    pub archive_dir: Option<PathBuf>,

    /// Bundled placeholder image that must never be deleted.
    pub placeholder_image: Option<PathBuf>,
}

/// Annotated preview settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// TrueType font for box labels (a system font is used when unset).
    pub font: Option<PathBuf>,
}

/// Map rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Latitude of the regional centre.
    pub center_latitude: f64,

    /// Longitude of the regional centre.
    pub center_longitude: f64,

    /// Zoom for the gallery and exploration maps.
    pub overview_zoom: u8,

    /// Zoom for the single-sighting map.
    pub point_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_latitude: map::CENTER_LATITUDE,
            center_longitude: map::CENTER_LONGITUDE,
            overview_zoom: map::OVERVIEW_ZOOM,
            point_zoom: map::POINT_ZOOM,
        }
    }
}

/// Fully resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// ONNX weights.
    pub model: PathBuf,
    /// `SQLite` database file.
    pub database: PathBuf,
    /// Archive directory.
    pub archive_dir: PathBuf,
    /// Placeholder image, if configured.
    pub placeholder_image: Option<PathBuf>,
}

impl Config {
    /// Fill unset paths from `data_dir`.
    pub fn resolve(&self, data_dir: &std::path::Path) -> ResolvedPaths {
        use crate::constants::{ARCHIVE_DIR_NAME, DATABASE_FILE_NAME, MODEL_RELATIVE_PATH};

        ResolvedPaths {
            model: self
                .model
                .path
                .clone()
                .unwrap_or_else(|| data_dir.join(MODEL_RELATIVE_PATH)),
            database: self
                .storage
                .database
                .clone()
                .unwrap_or_else(|| data_dir.join(DATABASE_FILE_NAME)),
            archive_dir: self
                .storage
                .archive_dir
                .clone()
                .unwrap_or_else(|| data_dir.join(ARCHIVE_DIR_NAME)),
            placeholder_image: self.storage.placeholder_image.clone(),
        }
    }
}
