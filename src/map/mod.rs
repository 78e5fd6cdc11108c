//! Map documents for sighting review.
//!
//! Maps are self-contained Leaflet pages. [`render_html`] is pure; a
//! [`MapBuilder`] decides where the document goes and how it is shown.

mod html;
mod viewer;

pub use html::render_html;
pub use viewer::BrowserMap;

use crate::constants::tiers;
use crate::error::Result;
use crate::geo::Coordinates;
use crate::store::Sighting;
use std::path::{Path, PathBuf};

/// What a map shows.
#[derive(Debug, Clone, Copy)]
pub enum MapView<'a> {
    /// One pending sighting, zoomed in.
    Point {
        /// Entered location.
        coordinates: Coordinates,
        /// Best detection score.
        confidence: f32,
        /// Number of boxes.
        detections_count: u32,
        /// Photo shown in the popup, if it exists.
        image: Option<&'a Path>,
    },
    /// Every stored sighting, most recent first.
    Gallery {
        /// Sightings to plot.
        sightings: &'a [Sighting],
    },
    /// Empty regional map for looking up coordinates.
    Explore,
}

/// Produces and presents map documents.
pub trait MapBuilder {
    /// Render `view` and present it. Returns the document location.
    fn show(&mut self, view: &MapView<'_>) -> Result<PathBuf>;
}

/// Marker styling by detection confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    /// 0.8 and above.
    Affirmative,
    /// From 0.6 up to 0.8.
    Cautionary,
    /// Below 0.6.
    Uncertain,
}

impl ConfidenceTier {
    /// Classify a confidence score.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= tiers::AFFIRMATIVE {
            Self::Affirmative
        } else if confidence >= tiers::CAUTIONARY {
            Self::Cautionary
        } else {
            Self::Uncertain
        }
    }

    /// Stable name of the tier.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Affirmative => "affirmative",
            Self::Cautionary => "cautionary",
            Self::Uncertain => "uncertain",
        }
    }

    /// Marker colour.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Affirmative => "green",
            Self::Cautionary => "orange",
            Self::Uncertain => "red",
        }
    }

    /// Font Awesome icon name.
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Affirmative => "leaf",
            Self::Cautionary => "exclamation-triangle",
            Self::Uncertain => "question",
        }
    }
}

/// Aggregate figures shown on the gallery map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalleryStats {
    /// Number of sightings.
    pub total_sightings: usize,
    /// Sum of detection counts.
    pub total_iguanas: u64,
    /// Mean detection confidence (0.0 when empty).
    pub mean_confidence: f64,
}

impl GalleryStats {
    /// Compute stats over `sightings`. Missing values count as zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_sightings(sightings: &[Sighting]) -> Self {
        let total_sightings = sightings.len();
        let total_iguanas = sightings
            .iter()
            .map(|s| u64::from(s.detections_count.unwrap_or(0)))
            .sum();
        let mean_confidence = if total_sightings == 0 {
            0.0
        } else {
            sightings
                .iter()
                .map(|s| s.detection_confidence.unwrap_or(0.0))
                .sum::<f64>()
                / total_sightings as f64
        };

        Self {
            total_sightings,
            total_iguanas,
            mean_confidence,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sighting(id: i64, confidence: f64, count: u32, image: &Path) -> Sighting {
        Sighting {
            id,
            latitude: 9.0,
            longitude: -80.0,
            original_image_path: PathBuf::from("/photos/original.jpg"),
            saved_image_path: image.to_path_buf(),
            detection_confidence: Some(confidence),
            detections_count: Some(count),
            timestamp: Some("2025-03-01T10:15:30.123456".to_string()),
        }
    }

    #[test]
    fn test_tier_mapping() {
        assert_eq!(ConfidenceTier::from_confidence(0.81).label(), "affirmative");
        assert_eq!(ConfidenceTier::from_confidence(0.65).label(), "cautionary");
        assert_eq!(ConfidenceTier::from_confidence(0.10).label(), "uncertain");
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        assert_eq!(
            ConfidenceTier::from_confidence(0.8),
            ConfidenceTier::Affirmative
        );
        assert_eq!(
            ConfidenceTier::from_confidence(0.6),
            ConfidenceTier::Cautionary
        );
        assert_eq!(
            ConfidenceTier::from_confidence(0.599),
            ConfidenceTier::Uncertain
        );
    }

    #[test]
    fn test_tier_styling() {
        let tier = ConfidenceTier::Cautionary;
        assert_eq!(tier.color(), "orange");
        assert_eq!(tier.icon(), "exclamation-triangle");
    }

    #[test]
    fn test_gallery_stats() {
        let image = Path::new("/archive/a.jpg");
        let sightings = vec![sighting(1, 0.9, 2, image), sighting(2, 0.5, 1, image)];
        let stats = GalleryStats::from_sightings(&sightings);
        assert_eq!(stats.total_sightings, 2);
        assert_eq!(stats.total_iguanas, 3);
        assert!((stats.mean_confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_gallery_stats_empty() {
        let stats = GalleryStats::from_sightings(&[]);
        assert_eq!(stats.total_sightings, 0);
        assert_eq!(stats.mean_confidence, 0.0);
    }
}
