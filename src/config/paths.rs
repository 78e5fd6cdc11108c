//! Platform-specific configuration and data paths.

use crate::constants::{APP_NAME, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory for the current platform.
///
/// - Linux: `~/.config/iguanapp/`
/// - macOS: `~/Library/Application Support/iguanapp/`
/// - Windows: `%APPDATA%\iguanapp\config\`
pub fn config_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the data directory holding the database, archive and model.
///
/// - Linux: `~/.local/share/iguanapp/`
/// - macOS: `~/Library/Application Support/iguanapp/`
/// - Windows: `%APPDATA%\iguanapp\data\`
pub fn data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(Error::DataDirNotFound)
}

/// Get the full path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}
