//! CLI argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Record green iguana sightings: detect, locate, archive and map.
#[derive(Debug, Parser)]
#[command(name = "iguanapp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (interactive shell when omitted).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "IGUANAPP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the ONNX detection model (overrides config).
    #[arg(long, global = true, env = "IGUANAPP_MODEL")]
    pub model: Option<PathBuf>,

    /// Sightings database file (overrides config).
    #[arg(long, global = true, env = "IGUANAPP_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory for archived sighting images (overrides config).
    #[arg(long, global = true, env = "IGUANAPP_ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Minimum detection confidence (0.0-1.0).
    #[arg(short = 'c', long, global = true, value_parser = parse_confidence, env = "IGUANAPP_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Write map documents without opening a viewer.
    #[arg(long, global = true)]
    pub no_open: bool,

    /// Only show warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: full trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive session (default).
    Shell,
    /// Record one sighting: detect, validate coordinates, archive and save.
    Record {
        /// Photo of the sighting.
        image: PathBuf,
        /// Latitude in decimal degrees (7.0 to 10.0).
        #[arg(long, allow_hyphen_values = true)]
        lat: String,
        /// Longitude in decimal degrees (-83.0 to -77.0).
        #[arg(long, allow_hyphen_values = true)]
        lon: String,
        /// Delete the original photo once it is archived.
        #[arg(long)]
        delete_original: bool,
    },
    /// Run detection on a photo without recording anything.
    Detect {
        /// Photo to analyse.
        image: PathBuf,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
        /// Write a copy of the photo with detection boxes drawn.
        #[arg(long, value_name = "OUTPUT")]
        preview: Option<PathBuf>,
    },
    /// List stored sightings, most recent first.
    List {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },
    /// Generate a map.
    Map {
        /// Which map to show.
        #[command(subcommand)]
        view: MapCommand,
    },
    /// Show archive usage.
    Archive,
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Map subcommand views.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum MapCommand {
    /// Every stored sighting.
    All,
    /// Empty regional map for finding coordinates.
    Explore,
    /// One stored sighting, zoomed in.
    Point {
        /// Sighting id as shown by `list`.
        id: i64,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Output format for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Aligned text table.
    Table,
    /// JSON array.
    Json,
    /// CSV with a header row.
    Csv,
}

/// Parse and validate confidence value.
fn parse_confidence(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "confidence must be between 0.0 and 1.0, got {value}"
        ));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confidence_valid() {
        assert_eq!(parse_confidence("0.5").ok(), Some(0.5));
        assert_eq!(parse_confidence("0.0").ok(), Some(0.0));
        assert_eq!(parse_confidence("1.0").ok(), Some(1.0));
    }

    #[test]
    fn test_parse_confidence_invalid() {
        assert!(parse_confidence("1.5").is_err());
        assert!(parse_confidence("-0.1").is_err());
        assert!(parse_confidence("abc").is_err());
    }

    #[test]
    fn test_no_subcommand_means_shell() {
        let cli = Cli::try_parse_from(["iguanapp"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_record_accepts_negative_longitude() {
        let cli = Cli::try_parse_from([
            "iguanapp",
            "record",
            "photo.jpg",
            "--lat",
            "8.9943",
            "--lon",
            "-79.5188",
            "--delete-original",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Record {
                lat,
                lon,
                delete_original,
                ..
            }) => {
                assert_eq!(lat, "8.9943");
                assert_eq!(lon, "-79.5188");
                assert!(delete_original);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "iguanapp",
            "map",
            "explore",
            "--no-open",
            "-c",
            "0.4",
            "-q",
        ])
        .unwrap();
        assert!(cli.global.no_open);
        assert!(cli.global.quiet);
        assert_eq!(cli.global.min_confidence, Some(0.4));
        assert!(matches!(
            cli.command,
            Some(Command::Map {
                view: MapCommand::Explore
            })
        ));
    }

    #[test]
    fn test_list_format() {
        let cli = Cli::try_parse_from(["iguanapp", "list", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::List {
                format: ListFormat::Json
            })
        ));
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["iguanapp", "config", "show"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_record_requires_coordinates() {
        let cli = Cli::try_parse_from(["iguanapp", "record", "photo.jpg", "--lat", "9.0"]);
        assert!(cli.is_err());
    }
}
