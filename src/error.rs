//! Error types for iguanapp.

use crate::geo::CoordinateError;
use std::path::PathBuf;

/// Result type alias for iguanapp operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure classes used to decide how an error is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Startup problem (bad config, missing model). Aborts the program.
    Configuration,
    /// Bad user input or an action taken out of order. State is unchanged.
    InputValidation,
    /// File, image, database or viewer failure. The action is abandoned.
    Io,
    /// Cleanup that failed after the real work succeeded. Logged only.
    BestEffort,
}

/// Top-level error type for iguanapp.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Data directory could not be determined.
    #[error("could not determine data directory for this platform")]
    DataDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Model weights file does not exist.
    #[error("model file does not exist: {path} (set [model].path in the config or use --model)")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: PathBuf,
    },

    /// Failed to build the detector session.
    #[error("failed to load detection model: {reason}")]
    DetectorBuild {
        /// Description of the build failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Selected image does not exist.
    #[error("image file does not exist: {path}")]
    ImageNotFound {
        /// Path to the missing image.
        path: PathBuf,
    },

    /// Failed to decode an image.
    #[error("could not load image '{path}'")]
    ImageDecode {
        /// Path to the image.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to write an annotated preview image.
    #[error("failed to write preview image '{path}'")]
    PreviewWrite {
        /// Path to the preview file.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },

    /// Entered coordinates were rejected.
    #[error(transparent)]
    InvalidCoordinates(#[from] CoordinateError),

    /// An action needs a selected image.
    #[error("please select an image first")]
    NoImageSelected,

    /// An action needs a detection run on the current image.
    #[error("run detection on the selected image first")]
    DetectionRequired,

    /// The last detection found nothing.
    #[error("no iguana was detected in the selected image")]
    NoIguanaDetected,

    /// Saving needs validated coordinates.
    #[error("enter and validate coordinates before saving")]
    CoordinatesRequired,

    /// No stored sighting has this id.
    #[error("no sighting with id {id}")]
    SightingNotFound {
        /// Requested id.
        id: i64,
    },

    /// Failed to create the archive directory.
    #[error("failed to create archive directory '{path}'")]
    ArchiveDirCreate {
        /// Path to the archive directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy an image into the archive.
    #[error("could not archive image '{from}' to '{to}'")]
    ArchiveCopy {
        /// Image being archived.
        from: PathBuf,
        /// Destination inside the archive.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No unused archive name could be generated.
    #[error("could not find a free file name in archive '{dir}'")]
    ArchiveNameExhausted {
        /// Archive directory.
        dir: PathBuf,
    },

    /// Removing a file during cleanup failed.
    #[error("failed to remove '{path}'")]
    Cleanup {
        /// File that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to open the sightings database.
    #[error("failed to open database '{path}'")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// Underlying database error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database statement failed.
    #[error("database error while {operation}")]
    Database {
        /// What the store was doing.
        operation: &'static str,
        /// Underlying database error.
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to write a map document.
    #[error("failed to write map document")]
    MapWrite {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to open a map document in the system viewer.
    #[error("failed to open map '{path}' in the system viewer")]
    MapOpen {
        /// Path to the map document.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON output.
    #[error("failed to write JSON output")]
    JsonWrite {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write CSV output.
    #[error("failed to write CSV output")]
    CsvWrite {
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

impl Error {
    /// Classify this error for reporting.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigDirNotFound
            | Self::DataDirNotFound
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigValidation { .. }
            | Self::ConfigWrite { .. }
            | Self::ConfigSerialize { .. }
            | Self::ModelFileNotFound { .. }
            | Self::DetectorBuild { .. } => ErrorCategory::Configuration,
            Self::ImageNotFound { .. }
            | Self::InvalidCoordinates(_)
            | Self::NoImageSelected
            | Self::DetectionRequired
            | Self::NoIguanaDetected
            | Self::CoordinatesRequired
            | Self::SightingNotFound { .. } => ErrorCategory::InputValidation,
            Self::Cleanup { .. } => ErrorCategory::BestEffort,
            Self::Io(_)
            | Self::Inference { .. }
            | Self::ImageDecode { .. }
            | Self::PreviewWrite { .. }
            | Self::ArchiveDirCreate { .. }
            | Self::ArchiveCopy { .. }
            | Self::ArchiveNameExhausted { .. }
            | Self::DatabaseOpen { .. }
            | Self::Database { .. }
            | Self::MapWrite { .. }
            | Self::MapOpen { .. }
            | Self::JsonWrite { .. }
            | Self::CsvWrite { .. } => ErrorCategory::Io,
        }
    }

    /// Shorthand for wrapping a statement error.
    pub(crate) fn database(operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Database { operation, source }
    }
}
