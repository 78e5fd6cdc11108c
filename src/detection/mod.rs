//! Iguana detection on still images.

mod engine;
mod preview;
mod types;
pub mod yolo;

pub use engine::{DetectionEngine, load_image};
pub use preview::{PreviewStyle, render_preview, save_preview};
pub use types::{BoxDetection, DetectionResult};
pub use yolo::{YoloDetector, YoloSettings};

use crate::error::Result;
use image::DynamicImage;

/// An object detector over decoded images.
///
/// Implementations apply their own confidence threshold; every box they
/// return counts as a detection.
pub trait Detector {
    /// Run the model once over `image`.
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<BoxDetection>>;
}
