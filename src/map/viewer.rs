//! Writes map documents to disk and opens them in the system viewer.

use crate::config::MapConfig;
use crate::error::{Error, Result};
use crate::map::{MapBuilder, MapView, render_html};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Map builder that writes a temporary HTML file and opens it.
///
/// Documents are kept after the process exits so the viewer can load them.
#[derive(Debug, Clone)]
pub struct BrowserMap {
    settings: MapConfig,
    open_in_viewer: bool,
    output_dir: Option<PathBuf>,
}

impl BrowserMap {
    /// Builder that opens every document it writes.
    pub fn new(settings: MapConfig) -> Self {
        Self {
            settings,
            open_in_viewer: true,
            output_dir: None,
        }
    }

    /// Only write documents, never launch a viewer.
    #[must_use]
    pub fn without_viewer(mut self) -> Self {
        self.open_in_viewer = false;
        self
    }

    /// Write documents into `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }
}

impl MapBuilder for BrowserMap {
    fn show(&mut self, view: &MapView<'_>) -> Result<PathBuf> {
        let html = render_html(view, &self.settings);

        let mut builder = tempfile::Builder::new();
        builder.prefix("iguanapp_map_").suffix(".html");
        let mut file = match &self.output_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| Error::MapWrite { source: e })?;

        file.write_all(html.as_bytes())
            .map_err(|e| Error::MapWrite { source: e })?;

        let (_, path) = file.keep().map_err(|e| Error::MapWrite { source: e.error })?;
        debug!("Wrote map document: {}", path.display());

        if self.open_in_viewer {
            open::that(&path).map_err(|e| Error::MapOpen {
                path: path.clone(),
                source: e,
            })?;
            info!("Opened map: {}", path.display());
        } else {
            info!("Map written to {}", path.display());
        }

        Ok(path)
    }
}
