//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "iguanapp";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default database file name inside the data directory.
pub const DATABASE_FILE_NAME: &str = "iguana_sightings.db";

/// Default archive directory name inside the data directory.
pub const ARCHIVE_DIR_NAME: &str = "saved_sightings";

/// Default model location relative to the data directory.
pub const MODEL_RELATIVE_PATH: &str = "yolo_model/best.onnx";

/// Fixed service area. Coordinates outside it are rejected.
pub mod service_area {
    /// Southern latitude bound (degrees, inclusive).
    pub const MIN_LATITUDE: f64 = 7.0;
    /// Northern latitude bound (degrees, inclusive).
    pub const MAX_LATITUDE: f64 = 10.0;
    /// Western longitude bound (degrees, inclusive).
    pub const MIN_LONGITUDE: f64 = -83.0;
    /// Eastern longitude bound (degrees, inclusive).
    pub const MAX_LONGITUDE: f64 = -77.0;
}

/// YOLO detector defaults.
pub mod model {
    /// Square network input size in pixels.
    pub const DEFAULT_INPUT_SIZE: u32 = 640;
    /// Minimum class score for a candidate box.
    pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;
    /// IoU above which overlapping boxes of the same class are suppressed.
    pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
    /// Letterbox padding value.
    pub const LETTERBOX_FILL: u8 = 114;
    /// Input size must be a multiple of the largest stride.
    pub const STRIDE: u32 = 32;
    /// Largest accepted input size.
    pub const MAX_INPUT_SIZE: u32 = 4096;
    /// Class name used when the config has none.
    pub const DEFAULT_CLASS_NAME: &str = "iguana";
}

/// Archive naming.
pub mod archive {
    /// Prefix for archived image file names.
    pub const FILE_PREFIX: &str = "iguana";
    /// Timestamp part of archived file names.
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
    /// Number of hex characters taken from a v4 UUID.
    pub const SHORT_ID_LEN: usize = 8;
    /// Attempts before giving up on finding a free name.
    pub const MAX_NAME_ATTEMPTS: usize = 16;
}

/// Map rendering defaults.
pub mod map {
    /// Regional centre latitude (Panama).
    pub const CENTER_LATITUDE: f64 = 8.9943;
    /// Regional centre longitude (Panama).
    pub const CENTER_LONGITUDE: f64 = -79.5188;
    /// Zoom used for the gallery and exploration maps.
    pub const OVERVIEW_ZOOM: u8 = 8;
    /// Zoom used for the single-point map.
    pub const POINT_ZOOM: u8 = 15;
    /// Highest zoom level served by the tile layer.
    pub const MAX_ZOOM: u8 = 19;
    /// Decimal places shown for clicked coordinates.
    pub const CLICK_DECIMALS: usize = 6;
    /// Leaflet version loaded by generated documents.
    pub const LEAFLET_VERSION: &str = "1.9.4";
}

/// Confidence tier thresholds for gallery markers.
pub mod tiers {
    /// Lower bound of the affirmative tier (inclusive).
    pub const AFFIRMATIVE: f64 = 0.8;
    /// Lower bound of the cautionary tier (inclusive).
    pub const CAUTIONARY: f64 = 0.6;
}

/// Timestamp formats.
pub mod time {
    /// Stored sighting timestamp (ISO-8601, local time, microseconds).
    pub const STORED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    /// Date shown in map popups and listings.
    pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";
}
