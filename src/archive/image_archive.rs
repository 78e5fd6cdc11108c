//! Filesystem-backed image archive.

use crate::archive::{ArchiveStats, Archiver, CleanupOutcome, ProtectedReason};
use crate::constants::archive::{FILE_PREFIX, MAX_NAME_ATTEMPTS, SHORT_ID_LEN, TIMESTAMP_FORMAT};
use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Archive rooted at one directory.
#[derive(Debug, Clone)]
pub struct ImageArchive {
    dir: PathBuf,
    placeholder: Option<PathBuf>,
}

impl ImageArchive {
    /// Open (and create if needed) the archive directory.
    pub fn open(dir: &Path, placeholder: Option<PathBuf>) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| Error::ArchiveDirCreate {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            placeholder,
        })
    }

    /// Archive directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Count archived files and their total size.
    pub fn stats(&self) -> Result<ArchiveStats> {
        let mut stats = ArchiveStats {
            directory: self.dir.clone(),
            file_count: 0,
            total_bytes: 0,
        };

        for entry in fs::read_dir(&self.dir)? {
            let metadata = entry?.metadata()?;
            if metadata.is_file() {
                stats.file_count += 1;
                stats.total_bytes += metadata.len();
            }
        }

        Ok(stats)
    }

    fn protection(&self, source: &Path, archived: &Path) -> Option<ProtectedReason> {
        let source = canonical(source);

        if source == canonical(archived) {
            return Some(ProtectedReason::ArchivedCopy);
        }
        if source.starts_with(canonical(&self.dir)) {
            return Some(ProtectedReason::InsideArchive);
        }
        if self
            .placeholder
            .as_deref()
            .is_some_and(|placeholder| source == canonical(placeholder))
        {
            return Some(ProtectedReason::Placeholder);
        }
        None
    }

    /// Create a new, previously nonexistent file for `source`.
    fn create_target(&self, source: &Path) -> Result<(PathBuf, File)> {
        let extension = source.extension().and_then(|e| e.to_str());

        for _ in 0..MAX_NAME_ATTEMPTS {
            let target = self.dir.join(archive_file_name(Local::now(), Uuid::new_v4(), extension));
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => return Ok((target, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Archive name taken, retrying: {}", target.display());
                }
                Err(e) => {
                    return Err(Error::ArchiveCopy {
                        from: source.to_path_buf(),
                        to: target,
                        source: e,
                    });
                }
            }
        }

        Err(Error::ArchiveNameExhausted {
            dir: self.dir.clone(),
        })
    }
}

impl Archiver for ImageArchive {
    fn archive(&self, source: &Path) -> Result<PathBuf> {
        let mut reader = File::open(source).map_err(|e| Error::ArchiveCopy {
            from: source.to_path_buf(),
            to: self.dir.clone(),
            source: e,
        })?;

        let (target, mut writer) = self.create_target(source)?;

        if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all()) {
            drop(writer);
            if let Err(remove_err) = fs::remove_file(&target) {
                warn!(
                    "Failed to remove partial archive copy {}: {remove_err}",
                    target.display()
                );
            }
            return Err(Error::ArchiveCopy {
                from: source.to_path_buf(),
                to: target,
                source: e,
            });
        }

        info!("Archived {} as {}", source.display(), target.display());
        Ok(target)
    }

    fn discard_original(&self, source: &Path, archived: &Path) -> Result<CleanupOutcome> {
        if !source.exists() {
            return Ok(CleanupOutcome::Missing);
        }

        if let Some(reason) = self.protection(source, archived) {
            info!("Keeping {} ({reason:?})", source.display());
            return Ok(CleanupOutcome::Protected(reason));
        }

        match fs::remove_file(source) {
            Ok(()) => {
                info!("Deleted original image: {}", source.display());
                Ok(CleanupOutcome::Deleted)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CleanupOutcome::Missing),
            Err(e) => Err(Error::Cleanup {
                path: source.to_path_buf(),
                source: e,
            }),
        }
    }

    fn remove(&self, archived: &Path) -> Result<()> {
        match fs::remove_file(archived) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Cleanup {
                path: archived.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Build `iguana_<YYYYmmdd_HHMMSS>_<8 hex>[.ext]`.
pub fn archive_file_name(now: DateTime<Local>, id: Uuid, extension: Option<&str>) -> String {
    let simple = id.simple().to_string();
    let short_id = &simple[..SHORT_ID_LEN];
    let stamp = now.format(TIMESTAMP_FORMAT);
    extension.map_or_else(
        || format!("{FILE_PREFIX}_{stamp}_{short_id}"),
        |ext| format!("{FILE_PREFIX}_{stamp}_{short_id}.{ext}"),
    )
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
