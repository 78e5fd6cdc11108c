//! Detection engine: image loading plus result summary.

use crate::detection::{DetectionResult, Detector};
use crate::error::{Error, Result};
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Runs a [`Detector`] over image files and summarises the boxes.
pub struct DetectionEngine {
    detector: Box<dyn Detector>,
}

impl DetectionEngine {
    /// Wrap a loaded detector.
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Self { detector }
    }

    /// Decode `path` and run detection on it.
    ///
    /// A file that cannot be decoded is an error, not a negative result.
    pub fn detect_file(&mut self, path: &Path) -> Result<DetectionResult> {
        let image = load_image(path)?;
        let result = self.detect_image(&image)?;
        info!("{}: {}", path.display(), result.summary());
        Ok(result)
    }

    /// Run detection on an already decoded image.
    pub fn detect_image(&mut self, image: &DynamicImage) -> Result<DetectionResult> {
        let start = Instant::now();
        let boxes = self.detector.detect(image)?;
        debug!(
            "Inference on {}x{} image took {:.1}ms, {} box(es)",
            image.width(),
            image.height(),
            start.elapsed().as_secs_f64() * 1000.0,
            boxes.len()
        );
        Ok(DetectionResult::from_detections(boxes))
    }
}

/// Decode an image file.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(Error::ImageNotFound {
            path: path.to_path_buf(),
        });
    }

    image::open(path).map_err(|e| Error::ImageDecode {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::detection::BoxDetection;
    use tempfile::TempDir;

    struct FixedDetector(Vec<f32>);

    impl Detector for FixedDetector {
        fn detect(&mut self, _image: &DynamicImage) -> Result<Vec<BoxDetection>> {
            Ok(self
                .0
                .iter()
                .map(|&confidence| BoxDetection {
                    confidence,
                    class_id: 0,
                    bbox: [0.0, 0.0, 4.0, 4.0],
                })
                .collect())
        }
    }

    fn write_png(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("photo.png");
        DynamicImage::new_rgb8(16, 16).save(&path).unwrap();
        path
    }

    #[test]
    fn test_detect_file_summarises_boxes() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir);
        let mut engine = DetectionEngine::new(Box::new(FixedDetector(vec![0.92, 0.40])));

        let result = engine.detect_file(&path).unwrap();
        assert!(result.is_iguana);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.detections_count, 2);
    }

    #[test]
    fn test_no_boxes_is_negative() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir);
        let mut engine = DetectionEngine::new(Box::new(FixedDetector(Vec::new())));

        let result = engine.detect_file(&path).unwrap();
        assert_eq!(result, DetectionResult::negative());
    }

    #[test]
    fn test_undecodable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let mut engine = DetectionEngine::new(Box::new(FixedDetector(vec![0.9])));

        let result = engine.detect_file(&path);
        assert!(matches!(result, Err(Error::ImageDecode { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = load_image(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(Error::ImageNotFound { .. })));
    }
}
