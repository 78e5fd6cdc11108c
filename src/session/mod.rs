//! Sighting session: the select, detect, locate, save workflow.
//!
//! A [`Session`] owns the collaborators (detector, archive, store, map
//! builder) and the current [`SessionState`]. Every operation either
//! succeeds and moves to the next state, or fails and leaves the state as
//! it was. Front ends read [`Session::enabled_actions`] to decide which
//! controls to offer and receive changes through a [`Notifier`].

mod state;

pub use state::{Action, Phase, SessionState, Verdict, enabled_actions};

use crate::archive::{Archiver, CleanupOutcome};
use crate::detection::{DetectionEngine, DetectionResult};
use crate::error::{Error, Result};
use crate::geo::{Coordinates, validate_coordinates};
use crate::map::{MapBuilder, MapView};
use crate::store::{NewSighting, SightingStore};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Receives state changes for display.
pub trait Notifier {
    /// The phase changed; `enabled` lists the actions now available.
    fn phase_changed(&mut self, _phase: Phase, _enabled: &[Action]) {}

    /// A human-readable status line.
    fn status(&mut self, _message: &str) {}

    /// The selected image changed (`None` when cleared).
    fn image_changed(&mut self, _image: Option<&Path>) {}
}

/// Notifier that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {}

/// Result of an operation that may have nothing to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A map was written (and opened) at this path.
    Shown(PathBuf),
    /// There was no data to present.
    NothingToShow,
}

/// What happened to the user's original photo after a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginalImage {
    /// The user chose to keep it.
    Kept,
    /// Cleanup ran.
    Cleaned(CleanupOutcome),
    /// Cleanup failed; the failure was logged.
    CleanupFailed,
}

impl OriginalImage {
    /// Line to show the user, if anything happened to the original.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Kept => None,
            Self::Cleaned(outcome) => Some(outcome.to_string()),
            Self::CleanupFailed => Some("The original image could not be deleted.".to_string()),
        }
    }
}

/// Confirmation of a saved sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    /// Database id.
    pub id: i64,
    /// Archived copy.
    pub saved_image: PathBuf,
    /// Saved location.
    pub coordinates: Coordinates,
    /// Original photo handling.
    pub original: OriginalImage,
}

/// Workflow controller.
pub struct Session {
    engine: DetectionEngine,
    archive: Box<dyn Archiver>,
    store: Box<dyn SightingStore>,
    maps: Box<dyn MapBuilder>,
    notifier: Box<dyn Notifier>,
    state: SessionState,
}

impl Session {
    /// Start an empty session.
    pub fn new(
        engine: DetectionEngine,
        archive: Box<dyn Archiver>,
        store: Box<dyn SightingStore>,
        maps: Box<dyn MapBuilder>,
    ) -> Self {
        Self {
            engine,
            archive,
            store,
            maps,
            notifier: Box::new(SilentNotifier),
            state: SessionState::NoImage,
        }
    }

    /// Route notifications to `notifier`. The current phase is reported at once.
    pub fn set_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifier = notifier;
        self.notify_phase();
    }

    /// Current state.
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Whether `action` is available now.
    pub fn is_enabled(&self, action: Action) -> bool {
        action.is_enabled_in(self.phase())
    }

    /// Actions available now.
    pub fn enabled_actions(&self) -> Vec<Action> {
        enabled_actions(self.phase())
    }

    /// The sighting store.
    pub fn store(&self) -> &dyn SightingStore {
        self.store.as_ref()
    }

    /// Select a photo. Any earlier detection or coordinates are discarded.
    pub fn select_image(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::ImageNotFound {
                path: path.to_path_buf(),
            });
        }

        info!("Selected image: {}", path.display());
        self.state = SessionState::ImageSelected {
            image: path.to_path_buf(),
        };
        self.notifier.image_changed(Some(path));
        self.notifier.status("Image loaded. Run detection next.");
        self.notify_phase();
        Ok(())
    }

    /// Run detection on the selected photo.
    ///
    /// Allowed again after an earlier run; validated coordinates are dropped.
    pub fn detect(&mut self) -> Result<DetectionResult> {
        let image = self
            .state
            .image()
            .ok_or(Error::NoImageSelected)?
            .to_path_buf();

        let detection = self.engine.detect_file(&image)?;

        self.notifier.status(&detection.summary());
        self.state = SessionState::Detected {
            image,
            detection: detection.clone(),
        };
        self.notify_phase();
        Ok(detection)
    }

    /// Validate coordinates for a positive detection and show them on a map.
    ///
    /// Once the coordinates validate they are kept even if the map cannot
    /// be produced; the map error is still returned.
    pub fn update_map(&mut self, latitude: &str, longitude: &str) -> Result<PathBuf> {
        let (image, detection) = match &self.state {
            SessionState::NoImage => return Err(Error::NoImageSelected),
            SessionState::ImageSelected { .. } => return Err(Error::DetectionRequired),
            SessionState::Detected { detection, .. } if !detection.is_iguana => {
                return Err(Error::NoIguanaDetected);
            }
            SessionState::Detected { image, detection }
            | SessionState::CoordinatesValid {
                image, detection, ..
            } => (image.clone(), detection.clone()),
        };

        let coordinates = validate_coordinates(latitude, longitude)?;
        info!("Coordinates accepted: {coordinates}");

        let confidence = detection.confidence;
        let detections_count = detection.detections_count;
        self.state = SessionState::CoordinatesValid {
            image: image.clone(),
            detection,
            coordinates,
        };
        self.notifier
            .status(&format!("Location set to {coordinates}. The sighting can be saved."));
        self.notify_phase();

        self.maps.show(&MapView::Point {
            coordinates,
            confidence,
            detections_count,
            image: Some(&image),
        })
    }

    /// Archive the photo and persist the sighting.
    ///
    /// `confirm_delete` is asked once the record is stored; answering yes
    /// removes the user's original (protected files are never touched).
    pub fn save_sighting(&mut self, confirm_delete: &mut dyn FnMut() -> bool) -> Result<SaveReceipt> {
        let (image, detection, coordinates) = match &self.state {
            SessionState::NoImage => return Err(Error::NoImageSelected),
            SessionState::ImageSelected { .. } => return Err(Error::DetectionRequired),
            SessionState::Detected { detection, .. } if !detection.is_iguana => {
                return Err(Error::NoIguanaDetected);
            }
            SessionState::Detected { .. } => return Err(Error::CoordinatesRequired),
            SessionState::CoordinatesValid {
                image,
                detection,
                coordinates,
            } => (image.clone(), detection.clone(), *coordinates),
        };

        if !detection.is_iguana {
            return Err(Error::NoIguanaDetected);
        }
        let coordinates = Coordinates::new(coordinates.latitude(), coordinates.longitude())?;

        let saved_image = self.archive.archive(&image)?;

        let record = NewSighting {
            latitude: coordinates.latitude(),
            longitude: coordinates.longitude(),
            original_image_path: image.clone(),
            saved_image_path: saved_image.clone(),
            detection_confidence: f64::from(detection.confidence),
            detections_count: detection.detections_count,
            recorded_at: Local::now().naive_local(),
        };

        let id = match self.store.insert(&record) {
            Ok(id) => id,
            Err(e) => {
                if let Err(cleanup) = self.archive.remove(&saved_image) {
                    warn!("Could not remove unreferenced archive copy: {cleanup}");
                }
                return Err(e);
            }
        };

        let original = if confirm_delete() {
            match self.archive.discard_original(&image, &saved_image) {
                Ok(outcome) => OriginalImage::Cleaned(outcome),
                Err(e) => {
                    warn!("Could not delete original image: {e}");
                    OriginalImage::CleanupFailed
                }
            }
        } else {
            OriginalImage::Kept
        };

        self.state = SessionState::NoImage;
        self.notifier.image_changed(None);
        self.notifier
            .status(&format!("Sighting #{id} saved at {coordinates}."));
        self.notify_phase();

        Ok(SaveReceipt {
            id,
            saved_image,
            coordinates,
            original,
        })
    }

    /// Map every stored sighting. State is not affected.
    pub fn show_all(&mut self) -> Result<Outcome> {
        let sightings = self.store.list_all()?;
        if sightings.is_empty() {
            self.notifier.status("No sightings saved yet.");
            return Ok(Outcome::NothingToShow);
        }

        let path = self.maps.show(&MapView::Gallery {
            sightings: &sightings,
        })?;
        info!("Map generated with {} sighting(s)", sightings.len());
        Ok(Outcome::Shown(path))
    }

    /// Open an empty regional map. State is not affected.
    pub fn explore_map(&mut self) -> Result<PathBuf> {
        self.maps.show(&MapView::Explore)
    }

    fn notify_phase(&mut self) {
        let phase = self.phase();
        let enabled = enabled_actions(phase);
        self.notifier.phase_changed(phase, &enabled);
    }
}
