//! Detection result types.

use serde::Serialize;

/// One box reported by the detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxDetection {
    /// Class score (0.0 - 1.0).
    pub confidence: f32,
    /// Index into the model's class list.
    pub class_id: usize,
    /// `[x1, y1, x2, y2]` in pixels of the original image.
    pub bbox: [f32; 4],
}

/// Summary of one detection run on one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    /// At least one box was reported.
    pub is_iguana: bool,
    /// Highest box confidence, 0.0 when nothing was found.
    pub confidence: f32,
    /// Number of boxes the detector returned.
    pub detections_count: u32,
    /// Every box, in detector order.
    pub all_detections: Vec<BoxDetection>,
}

impl DetectionResult {
    /// Summarise the detector's boxes.
    ///
    /// The detector's own thresholding is authoritative: every returned box
    /// counts, and the summary confidence is the best box's score.
    pub fn from_detections(detections: Vec<BoxDetection>) -> Self {
        let confidence = detections
            .iter()
            .map(|d| d.confidence)
            .fold(None, |best: Option<f32>, c| Some(best.map_or(c, |b| b.max(c))));

        let Some(confidence) = confidence else {
            return Self::negative();
        };

        Self {
            is_iguana: true,
            confidence,
            detections_count: u32::try_from(detections.len()).unwrap_or(u32::MAX),
            all_detections: detections,
        }
    }

    /// Result for an image with no detections.
    pub const fn negative() -> Self {
        Self {
            is_iguana: false,
            confidence: 0.0,
            detections_count: 0,
            all_detections: Vec::new(),
        }
    }

    /// The highest-confidence box.
    pub fn best(&self) -> Option<&BoxDetection> {
        self.all_detections
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        if !self.is_iguana {
            return "No iguanas detected.".to_string();
        }
        let mut text = format!(
            "Iguana detected with {:.1}% confidence.",
            self.confidence * 100.0
        );
        if self.detections_count > 1 {
            text.push_str(&format!(" Total detections: {}.", self.detections_count));
        }
        text
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn detection(confidence: f32) -> BoxDetection {
        BoxDetection {
            confidence,
            class_id: 0,
            bbox: [10.0, 10.0, 50.0, 40.0],
        }
    }

    #[test]
    fn test_empty_detections_are_negative() {
        let result = DetectionResult::from_detections(Vec::new());
        assert!(!result.is_iguana);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.detections_count, 0);
        assert!(result.all_detections.is_empty());
        assert_eq!(result, DetectionResult::negative());
    }

    #[test]
    fn test_summary_uses_max_confidence_and_full_count() {
        let result = DetectionResult::from_detections(vec![detection(0.92), detection(0.40)]);
        assert!(result.is_iguana);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.detections_count, 2);
    }

    #[test]
    fn test_order_is_preserved() {
        let result = DetectionResult::from_detections(vec![detection(0.40), detection(0.92)]);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.all_detections[0].confidence, 0.40);
        assert_eq!(result.best().unwrap().confidence, 0.92);
    }

    #[test]
    fn test_summary_text() {
        let single = DetectionResult::from_detections(vec![detection(0.875)]);
        assert_eq!(single.summary(), "Iguana detected with 87.5% confidence.");

        let multiple = DetectionResult::from_detections(vec![detection(0.9), detection(0.5)]);
        assert!(multiple.summary().ends_with("Total detections: 2."));

        assert_eq!(DetectionResult::negative().summary(), "No iguanas detected.");
    }
}
