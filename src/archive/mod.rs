//! Managed archive of sighting images.

mod image_archive;

pub use image_archive::{ImageArchive, archive_file_name};

use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Copies sighting images into managed storage and cleans up originals.
pub trait Archiver {
    /// Copy `source` into the archive under a fresh unique name.
    fn archive(&self, source: &Path) -> Result<PathBuf>;

    /// Delete the user's original after it was archived as `archived`.
    ///
    /// Protected files are left alone and reported as such.
    fn discard_original(&self, source: &Path, archived: &Path) -> Result<CleanupOutcome>;

    /// Remove an archived copy that ended up unreferenced.
    fn remove(&self, archived: &Path) -> Result<()>;
}

/// What happened to an original image during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The file was deleted.
    Deleted,
    /// The file no longer existed.
    Missing,
    /// The file is protected and was kept.
    Protected(ProtectedReason),
}

/// Why a file was not deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedReason {
    /// It is the archived copy itself.
    ArchivedCopy,
    /// It lives inside the archive directory.
    InsideArchive,
    /// It is the bundled placeholder image.
    Placeholder,
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => f.write_str("Original image deleted."),
            Self::Missing => f.write_str("Original image was already gone."),
            Self::Protected(reason) => write!(f, "Original image kept: {reason}."),
        }
    }
}

impl fmt::Display for ProtectedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ArchivedCopy => "it is the saved copy",
            Self::InsideArchive => "it is stored in the archive directory",
            Self::Placeholder => "it is the default placeholder image",
        })
    }
}

/// Summary of the archive directory contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    /// Archive directory.
    pub directory: PathBuf,
    /// Number of regular files.
    pub file_count: usize,
    /// Combined size in bytes.
    pub total_bytes: u64,
}

impl ArchiveStats {
    /// Combined size in mebibytes.
    #[allow(clippy::cast_precision_loss)]
    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}
