//! `SQLite` sighting store.

use crate::constants::time::STORED_FORMAT;
use crate::error::{Error, Result};
use crate::store::{NewSighting, Sighting, SightingStore};
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS sightings (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude             REAL NOT NULL,
    longitude            REAL NOT NULL,
    original_image_path  TEXT NOT NULL,
    saved_image_path     TEXT NOT NULL,
    detection_confidence REAL,
    detections_count     INTEGER,
    timestamp            TEXT
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_sightings_timestamp ON sightings(timestamp)";

const SELECT_ALL: &str = "SELECT id, latitude, longitude, original_image_path, saved_image_path,
        detection_confidence, detections_count, timestamp
    FROM sightings
    ORDER BY timestamp DESC, id DESC";

/// Sighting store backed by a single `SQLite` file.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| Error::DatabaseOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("Opened database: {}", path.display());

        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.initialize()?;
        Ok(store)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        let store = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Database file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SightingStore for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn
            .execute(CREATE_TABLE, [])
            .map_err(|e| Error::database("creating the sightings table", e))?;
        self.conn
            .execute(CREATE_INDEX, [])
            .map_err(|e| Error::database("creating the timestamp index", e))?;
        Ok(())
    }

    fn insert(&self, sighting: &NewSighting) -> Result<i64> {
        let timestamp = sighting.recorded_at.format(STORED_FORMAT).to_string();

        self.conn
            .execute(
                "INSERT INTO sightings (latitude, longitude, original_image_path, saved_image_path,
                    detection_confidence, detections_count, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    sighting.latitude,
                    sighting.longitude,
                    sighting.original_image_path.to_string_lossy(),
                    sighting.saved_image_path.to_string_lossy(),
                    sighting.detection_confidence,
                    sighting.detections_count,
                    timestamp,
                ],
            )
            .map_err(|e| Error::database("inserting a sighting", e))?;

        let id = self.conn.last_insert_rowid();
        info!(
            "Saved sighting #{id} at {:.6}, {:.6}",
            sighting.latitude, sighting.longitude
        );
        Ok(id)
    }

    fn for_each(&self, visit: &mut dyn FnMut(Sighting) -> Result<()>) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(SELECT_ALL)
            .map_err(|e| Error::database("reading sightings", e))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| Error::database("reading sightings", e))?;

        while let Some(row) = rows
            .next()
            .map_err(|e| Error::database("reading sightings", e))?
        {
            let sighting =
                sighting_from_row(row).map_err(|e| Error::database("decoding a sighting", e))?;
            visit(sighting)?;
        }
        Ok(())
    }

    fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sightings", [], |row| row.get(0))
            .map_err(|e| Error::database("counting sightings", e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn sighting_from_row(row: &Row<'_>) -> rusqlite::Result<Sighting> {
    Ok(Sighting {
        id: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        original_image_path: PathBuf::from(row.get::<_, String>(3)?),
        saved_image_path: PathBuf::from(row.get::<_, String>(4)?),
        detection_confidence: row.get(5)?,
        detections_count: row.get(6)?,
        timestamp: row.get(7)?,
    })
}
