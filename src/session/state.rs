//! Session states and the actions they enable.

use crate::detection::DetectionResult;
use crate::geo::Coordinates;
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of the last detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one iguana was found.
    Positive,
    /// Nothing was found.
    Negative,
}

/// Coarse session phase, used to drive the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing selected yet, or the last sighting was just saved.
    NoImage,
    /// An image is selected but not analysed.
    ImageSelected,
    /// Detection ran. A positive verdict waits for coordinates.
    Detected(Verdict),
    /// Coordinates were validated for a positive detection.
    CoordinatesValid,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoImage => "no image",
            Self::ImageSelected => "image selected",
            Self::Detected(Verdict::Positive) => "iguana detected, waiting for coordinates",
            Self::Detected(Verdict::Negative) => "no iguana detected",
            Self::CoordinatesValid => "ready to save",
        };
        f.write_str(name)
    }
}

/// Everything the session knows, per phase.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Nothing selected.
    #[default]
    NoImage,
    /// Image chosen.
    ImageSelected {
        /// Selected photo.
        image: PathBuf,
    },
    /// Detection finished.
    Detected {
        /// Selected photo.
        image: PathBuf,
        /// Detection summary.
        detection: DetectionResult,
    },
    /// Coordinates accepted for a positive detection.
    CoordinatesValid {
        /// Selected photo.
        image: PathBuf,
        /// Detection summary, always positive.
        detection: DetectionResult,
        /// Validated location.
        coordinates: Coordinates,
    },
}

impl SessionState {
    /// Phase of this state.
    pub fn phase(&self) -> Phase {
        match self {
            Self::NoImage => Phase::NoImage,
            Self::ImageSelected { .. } => Phase::ImageSelected,
            Self::Detected { detection, .. } => Phase::Detected(if detection.is_iguana {
                Verdict::Positive
            } else {
                Verdict::Negative
            }),
            Self::CoordinatesValid { .. } => Phase::CoordinatesValid,
        }
    }

    /// The selected photo, if any.
    pub fn image(&self) -> Option<&Path> {
        match self {
            Self::NoImage => None,
            Self::ImageSelected { image }
            | Self::Detected { image, .. }
            | Self::CoordinatesValid { image, .. } => Some(image),
        }
    }

    /// The last detection on the selected photo, if any.
    pub fn detection(&self) -> Option<&DetectionResult> {
        match self {
            Self::Detected { detection, .. } | Self::CoordinatesValid { detection, .. } => {
                Some(detection)
            }
            _ => None,
        }
    }

    /// Validated coordinates, if any.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::CoordinatesValid { coordinates, .. } => Some(*coordinates),
            _ => None,
        }
    }
}

/// User actions exposed to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Pick a photo.
    SelectImage,
    /// Run the detector on the photo.
    Detect,
    /// Validate coordinates and show them on a map.
    UpdateMap,
    /// Persist the sighting.
    SaveSighting,
    /// Map every stored sighting.
    ShowAll,
    /// Open an empty map for finding coordinates.
    ExploreMap,
}

impl Action {
    /// Every action, in display order.
    pub const ALL: [Self; 6] = [
        Self::SelectImage,
        Self::Detect,
        Self::UpdateMap,
        Self::SaveSighting,
        Self::ShowAll,
        Self::ExploreMap,
    ];

    /// Whether this action is available in `phase`.
    pub const fn is_enabled_in(self, phase: Phase) -> bool {
        match self {
            Self::SelectImage | Self::ShowAll | Self::ExploreMap => true,
            Self::Detect => !matches!(phase, Phase::NoImage),
            Self::UpdateMap => matches!(
                phase,
                Phase::Detected(Verdict::Positive) | Phase::CoordinatesValid
            ),
            Self::SaveSighting => matches!(phase, Phase::CoordinatesValid),
        }
    }

    /// Short label for menus and status lines.
    pub const fn label(self) -> &'static str {
        match self {
            Self::SelectImage => "select image",
            Self::Detect => "detect iguana",
            Self::UpdateMap => "update map",
            Self::SaveSighting => "save sighting",
            Self::ShowAll => "show all sightings",
            Self::ExploreMap => "explore map",
        }
    }
}

/// Actions available in `phase`, in display order.
pub fn enabled_actions(phase: Phase) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|action| action.is_enabled_in(phase))
        .collect()
}
