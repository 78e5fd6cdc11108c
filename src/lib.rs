//! Iguanapp - green iguana sighting recorder.
//!
//! Photos are checked with a YOLO detector, located with validated GPS
//! coordinates, archived and stored in `SQLite`, and reviewed on Leaflet maps.

#![warn(missing_docs)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod geo;
pub mod map;
pub mod session;
pub mod shell;
pub mod store;

use archive::ImageArchive;
use clap::Parser;
use cli::{Cli, Command, ConfigAction, GlobalArgs, ListFormat, MapCommand};
use config::{
    Config, ResolvedPaths, config_file_path, data_dir, load_config_file, load_default_config, save_config,
};
use detection::{DetectionEngine, PreviewStyle, YoloDetector, YoloSettings, load_image, save_preview};
use map::{BrowserMap, MapBuilder, MapView};
use serde::Serialize;
use session::{Phase, Session};
use std::path::{Path, PathBuf};
use store::{Sighting, SightingStore, SqliteStore};
use tracing::{debug, info, warn};

pub use error::{Error, Result};

/// Main entry point for the iguanapp CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    let command = cli.command.unwrap_or(Command::Shell);
    if let Command::Config { action } = command {
        let path = match &cli.global.config {
            Some(path) => path.clone(),
            None => config_file_path()?,
        };
        return handle_config_command(action, &path);
    }

    let mut config = match &cli.global.config {
        Some(path) => load_config_file(path)?,
        None => load_default_config()?,
    };
    apply_overrides(&mut config, &cli.global);
    config::validate_config(&config)?;
    let paths = resolve_paths(&config)?;
    debug!("Resolved paths: {:?}", paths);

    let app = App {
        config,
        paths,
        no_open: cli.global.no_open,
        progress: !cli.global.quiet,
    };
    app.handle(command)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default; -v shows its warnings.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Layer command-line and environment overrides over the file config.
fn apply_overrides(config: &mut Config, args: &GlobalArgs) {
    if let Some(model) = &args.model {
        config.model.path = Some(model.clone());
    }
    if let Some(database) = &args.database {
        config.storage.database = Some(database.clone());
    }
    if let Some(archive_dir) = &args.archive_dir {
        config.storage.archive_dir = Some(archive_dir.clone());
    }
    if let Some(min_confidence) = args.min_confidence {
        config.model.min_confidence = min_confidence;
    }
}

/// Resolve file locations. The data directory is only required for
/// paths the config leaves unset.
fn resolve_paths(config: &Config) -> Result<ResolvedPaths> {
    let fully_specified = config.model.path.is_some()
        && config.storage.database.is_some()
        && config.storage.archive_dir.is_some();

    match data_dir() {
        Ok(dir) => Ok(config.resolve(&dir)),
        Err(_) if fully_specified => Ok(config.resolve(Path::new("."))),
        Err(e) => Err(e),
    }
}

/// Resolved settings shared by the command handlers.
struct App {
    config: Config,
    paths: ResolvedPaths,
    no_open: bool,
    progress: bool,
}

impl App {
    fn handle(&self, command: Command) -> Result<()> {
        match command {
            Command::Shell => self.run_shell(),
            Command::Record {
                image,
                lat,
                lon,
                delete_original,
            } => self.record(&image, &lat, &lon, delete_original),
            Command::Detect {
                image,
                json,
                preview,
            } => self.detect(&image, json, preview.as_deref()),
            Command::List { format } => self.list(format),
            Command::Map { view } => self.map(view),
            Command::Archive => self.archive_stats(),
            Command::Config { .. } => Ok(()),
        }
    }

    fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.paths.database)
    }

    fn open_archive(&self) -> Result<ImageArchive> {
        ImageArchive::open(
            &self.paths.archive_dir,
            self.paths.placeholder_image.clone(),
        )
    }

    fn map_builder(&self) -> BrowserMap {
        let maps = BrowserMap::new(self.config.map.clone());
        if self.no_open {
            maps.without_viewer()
        } else {
            maps
        }
    }

    fn preview_style(&self) -> PreviewStyle {
        PreviewStyle::new(&self.config.model.class_names, self.config.preview.font.as_deref())
    }

    fn load_engine(&self) -> Result<DetectionEngine> {
        let spinner = cli::progress::start_spinner("Loading detection model", self.progress);
        let loaded = YoloDetector::load(&self.paths.model, YoloSettings::from(&self.config.model));
        cli::progress::finish_spinner(spinner);

        match loaded {
            Ok(detector) => Ok(DetectionEngine::new(Box::new(detector))),
            Err(e @ Error::ModelFileNotFound { .. }) => {
                cli::help::print_first_time_help(&self.paths.model);
                println!();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn session(&self) -> Result<Session> {
        let engine = self.load_engine()?;
        let archive = self.open_archive()?;
        let store = self.open_store()?;
        Ok(Session::new(
            engine,
            Box::new(archive),
            Box::new(store),
            Box::new(self.map_builder()),
        ))
    }

    fn run_shell(&self) -> Result<()> {
        let mut session = self.session()?;
        cli::help::print_shell_banner();
        session.set_notifier(Box::new(shell::ConsoleNotifier));

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        shell::run_shell(&mut session, &self.preview_style(), stdin.lock(), &mut stdout)
    }

    fn record(&self, image: &Path, lat: &str, lon: &str, delete_original: bool) -> Result<()> {
        let mut session = self.session()?;
        session.select_image(image)?;

        let spinner = cli::progress::start_spinner("Detecting iguanas", self.progress);
        let detected = session.detect();
        cli::progress::finish_spinner(spinner);
        let detection = detected?;

        println!("{}", detection.summary());
        if !detection.is_iguana {
            return Err(Error::NoIguanaDetected);
        }

        if let Some(map_path) = locate(&mut session, lat, lon)? {
            println!("Location map: {}", map_path.display());
        }

        let receipt = session.save_sighting(&mut || delete_original)?;
        println!(
            "Saved sighting #{} at {} (archived as {})",
            receipt.id,
            receipt.coordinates,
            receipt.saved_image.display()
        );
        if let Some(notice) = receipt.original.notice() {
            println!("{notice}");
        }
        Ok(())
    }

    fn detect(&self, image: &Path, json: bool, preview: Option<&Path>) -> Result<()> {
        let mut engine = self.load_engine()?;
        let decoded = load_image(image)?;

        let spinner = cli::progress::start_spinner("Detecting iguanas", self.progress);
        let detected = engine.detect_image(&decoded);
        cli::progress::finish_spinner(spinner);
        let result = detected?;
        info!("{}: {}", image.display(), result.summary());

        if let Some(output) = preview {
            save_preview(&decoded, &result.all_detections, &self.preview_style(), output)?;
            if !json {
                println!("Preview written to {}", output.display());
            }
        }

        if json {
            let report = DetectReport {
                image,
                classes: result
                    .all_detections
                    .iter()
                    .map(|d| self.class_name(d.class_id))
                    .collect(),
                result: &result,
            };
            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), &report)
                .map_err(|e| Error::JsonWrite { source: e })?;
            println!();
        } else {
            println!("{}", result.summary());
            for (i, d) in result.all_detections.iter().enumerate() {
                let [x1, y1, x2, y2] = d.bbox;
                println!(
                    "  {}. {} {:.1}% at ({x1:.0}, {y1:.0}) - ({x2:.0}, {y2:.0})",
                    i + 1,
                    self.class_name(d.class_id),
                    d.confidence * 100.0
                );
            }
        }
        Ok(())
    }

    fn class_name(&self, class_id: usize) -> &str {
        self.config
            .model
            .class_names
            .get(class_id)
            .map_or("unknown", String::as_str)
    }

    fn list(&self, format: ListFormat) -> Result<()> {
        let store = self.open_store()?;
        let sightings = store.list_all()?;

        match format {
            ListFormat::Json => {
                let stdout = std::io::stdout();
                serde_json::to_writer_pretty(stdout.lock(), &sightings)
                    .map_err(|e| Error::JsonWrite { source: e })?;
                println!();
            }
            ListFormat::Csv => {
                let mut writer = csv::Writer::from_writer(std::io::stdout());
                for sighting in &sightings {
                    writer
                        .serialize(sighting)
                        .map_err(|e| Error::CsvWrite { source: e })?;
                }
                writer.flush()?;
            }
            ListFormat::Table => print_table(&sightings),
        }
        Ok(())
    }

    fn map(&self, view: MapCommand) -> Result<()> {
        let mut maps = self.map_builder();

        let path = match view {
            MapCommand::Explore => maps.show(&MapView::Explore)?,
            MapCommand::All => {
                let sightings = self.open_store()?.list_all()?;
                if sightings.is_empty() {
                    println!("No sightings saved yet.");
                    return Ok(());
                }
                maps.show(&MapView::Gallery {
                    sightings: &sightings,
                })?
            }
            MapCommand::Point { id } => {
                let sighting = self
                    .open_store()?
                    .list_all()?
                    .into_iter()
                    .find(|s| s.id == id)
                    .ok_or(Error::SightingNotFound { id })?;
                let coordinates =
                    geo::Coordinates::new(sighting.latitude, sighting.longitude)?;
                #[allow(clippy::cast_possible_truncation)]
                let confidence = sighting.detection_confidence.unwrap_or(0.0) as f32;
                maps.show(&MapView::Point {
                    coordinates,
                    confidence,
                    detections_count: sighting.detections_count.unwrap_or(0),
                    image: Some(&sighting.saved_image_path),
                })?
            }
        };

        println!("Map: {}", path.display());
        Ok(())
    }

    fn archive_stats(&self) -> Result<()> {
        let stats = self.open_archive()?.stats()?;
        println!("Saved images");
        println!("  Files:    {}", stats.file_count);
        println!("  Size:     {:.2} MB", stats.total_megabytes());
        println!("  Location: {}", stats.directory.display());
        Ok(())
    }
}

/// Validate the location and show it. Once the coordinates are accepted a
/// map failure is only logged, so the sighting can still be saved.
fn locate(session: &mut Session, lat: &str, lon: &str) -> Result<Option<PathBuf>> {
    match session.update_map(lat, lon) {
        Ok(path) => Ok(Some(path)),
        Err(e) if session.phase() == Phase::CoordinatesValid => {
            warn!("Could not show the location map: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[derive(Serialize)]
struct DetectReport<'a> {
    image: &'a Path,
    classes: Vec<&'a str>,
    #[serde(flatten)]
    result: &'a detection::DetectionResult,
}

fn print_table(sightings: &[Sighting]) {
    if sightings.is_empty() {
        println!("No sightings saved yet.");
        return;
    }

    println!(
        "{:>5}  {:<16}  {:>10}  {:>11}  {:>6}  {:>5}  image",
        "id", "date", "latitude", "longitude", "conf", "count"
    );
    for s in sightings {
        let confidence = s
            .detection_confidence
            .map_or_else(|| "-".to_string(), |c| format!("{:.1}%", c * 100.0));
        let count = s
            .detections_count
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "{:>5}  {:<16}  {:>10.6}  {:>11.6}  {:>6}  {:>5}  {}",
            s.id,
            s.display_date(),
            s.latitude,
            s.longitude,
            confidence,
            count,
            s.saved_image_path.display()
        );
    }
    println!();
    println!("{} sighting(s)", sightings.len());
}

fn handle_config_command(action: ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps:");
                println!("  Set [model].path to your exported YOLO weights (best.onnx)");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config_file(path)?;
            let contents = toml::to_string_pretty(&config)
                .map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("# {}", path.display());
            println!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::detection::{BoxDetection, Detector};
    use image::DynamicImage;
    use tempfile::TempDir;

    struct OneIguana;

    impl Detector for OneIguana {
        fn detect(&mut self, _image: &DynamicImage) -> Result<Vec<BoxDetection>> {
            Ok(vec![BoxDetection {
                confidence: 0.9,
                class_id: 0,
                bbox: [1.0, 1.0, 8.0, 8.0],
            }])
        }
    }

    struct BrokenViewer;

    impl MapBuilder for BrokenViewer {
        fn show(&mut self, _view: &MapView<'_>) -> Result<PathBuf> {
            Err(Error::MapOpen {
                path: PathBuf::from("/tmp/iguanapp_map.html"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    fn detected_session(dir: &TempDir) -> Session {
        let photo = dir.path().join("photo.png");
        DynamicImage::new_rgb8(10, 10).save(&photo).unwrap();

        let mut session = Session::new(
            DetectionEngine::new(Box::new(OneIguana)),
            Box::new(ImageArchive::open(&dir.path().join("saved"), None).unwrap()),
            Box::new(SqliteStore::open_in_memory().unwrap()),
            Box::new(BrokenViewer),
        );
        session.select_image(&photo).unwrap();
        session.detect().unwrap();
        session
    }

    #[test]
    fn test_viewer_failure_still_allows_saving() {
        let dir = TempDir::new().unwrap();
        let mut session = detected_session(&dir);

        assert_eq!(locate(&mut session, "9.0", "-80.0").unwrap(), None);
        assert_eq!(session.phase(), Phase::CoordinatesValid);

        let receipt = session.save_sighting(&mut || false).unwrap();
        assert_eq!(receipt.id, 1);
        assert_eq!(session.store().count().unwrap(), 1);
    }

    #[test]
    fn test_invalid_location_is_still_an_error() {
        let dir = TempDir::new().unwrap();
        let mut session = detected_session(&dir);

        let err = locate(&mut session, "40.0", "-80.0").unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinates(_)));
        assert_ne!(session.phase(), Phase::CoordinatesValid);
    }

    fn args(extra: &[&str]) -> GlobalArgs {
        let mut argv = vec!["iguanapp"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            &args(&[
                "--model",
                "/m/best.onnx",
                "--database",
                "/d/s.db",
                "--archive-dir",
                "/a",
                "-c",
                "0.5",
            ]),
        );
        assert_eq!(config.model.path, Some(PathBuf::from("/m/best.onnx")));
        assert_eq!(config.storage.database, Some(PathBuf::from("/d/s.db")));
        assert_eq!(config.storage.archive_dir, Some(PathBuf::from("/a")));
        assert_eq!(config.model.min_confidence, 0.5);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        config.storage.database = Some(PathBuf::from("/keep.db"));
        apply_overrides(&mut config, &args(&[]));
        assert_eq!(config.storage.database, Some(PathBuf::from("/keep.db")));
    }

    #[test]
    fn test_resolve_paths_uses_explicit_locations() {
        let mut config = Config::default();
        config.model.path = Some(PathBuf::from("/m/best.onnx"));
        config.storage.database = Some(PathBuf::from("/d/s.db"));
        config.storage.archive_dir = Some(PathBuf::from("/a"));

        let paths = resolve_paths(&config).unwrap();
        assert_eq!(paths.model, PathBuf::from("/m/best.onnx"));
        assert_eq!(paths.database, PathBuf::from("/d/s.db"));
        assert_eq!(paths.archive_dir, PathBuf::from("/a"));
    }
}
