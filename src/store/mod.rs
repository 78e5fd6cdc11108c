//! Persistent sighting records.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::constants::time::{DISPLAY_FORMAT, STORED_FORMAT};
use crate::error::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

/// A stored sighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sighting {
    /// Row id, assigned by the store.
    pub id: i64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Where the user's photo was when the sighting was recorded.
    pub original_image_path: PathBuf,
    /// Archived copy of the photo.
    pub saved_image_path: PathBuf,
    /// Best detection score, if recorded.
    pub detection_confidence: Option<f64>,
    /// Number of boxes, if recorded.
    pub detections_count: Option<u32>,
    /// Local ISO-8601 timestamp as stored.
    pub timestamp: Option<String>,
}

impl Sighting {
    /// Parsed timestamp.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?;
        NaiveDateTime::parse_from_str(raw, STORED_FORMAT)
            .or_else(|_| raw.parse::<NaiveDateTime>())
            .ok()
    }

    /// `dd/mm/YYYY HH:MM`, or the raw date part when the timestamp does not parse.
    pub fn display_date(&self) -> String {
        if let Some(at) = self.recorded_at() {
            return at.format(DISPLAY_FORMAT).to_string();
        }
        self.timestamp
            .as_deref()
            .and_then(|raw| raw.split('T').next())
            .unwrap_or_default()
            .to_string()
    }
}

/// Insert payload for a new sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSighting {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// The user's photo.
    pub original_image_path: PathBuf,
    /// Archived copy of the photo.
    pub saved_image_path: PathBuf,
    /// Best detection score.
    pub detection_confidence: f64,
    /// Number of boxes.
    pub detections_count: u32,
    /// Local time of recording.
    pub recorded_at: NaiveDateTime,
}

/// Append-only sighting storage.
pub trait SightingStore {
    /// Create the schema if it does not exist. Safe to call repeatedly.
    fn initialize(&self) -> Result<()>;

    /// Persist one sighting and return its id.
    fn insert(&self, sighting: &NewSighting) -> Result<i64>;

    /// Visit every sighting, most recent first.
    ///
    /// Rows are read one at a time; calling again starts a fresh scan.
    fn for_each(&self, visit: &mut dyn FnMut(Sighting) -> Result<()>) -> Result<()>;

    /// Number of stored sightings.
    fn count(&self) -> Result<u64>;

    /// Collect every sighting, most recent first.
    fn list_all(&self) -> Result<Vec<Sighting>> {
        let mut sightings = Vec::new();
        self.for_each(&mut |sighting| {
            sightings.push(sighting);
            Ok(())
        })?;
        Ok(sightings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(timestamp: Option<&str>) -> Sighting {
        Sighting {
            id: 1,
            latitude: 9.0,
            longitude: -80.0,
            original_image_path: PathBuf::from("/photos/a.jpg"),
            saved_image_path: PathBuf::from("/archive/a.jpg"),
            detection_confidence: Some(0.85),
            detections_count: Some(1),
            timestamp: timestamp.map(str::to_string),
        }
    }

    #[test]
    fn test_display_date_formats_stored_timestamp() {
        let s = sighting(Some("2025-03-01T10:15:30.123456"));
        assert_eq!(s.display_date(), "01/03/2025 10:15");
    }

    #[test]
    fn test_display_date_accepts_whole_seconds() {
        let s = sighting(Some("2025-03-01T10:15:30"));
        assert_eq!(s.display_date(), "01/03/2025 10:15");
    }

    #[test]
    fn test_display_date_falls_back_to_date_part() {
        let s = sighting(Some("2025-03-01Tgarbage"));
        assert_eq!(s.display_date(), "2025-03-01");
        assert_eq!(sighting(None).display_date(), "");
    }
}
