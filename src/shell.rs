//! Interactive line-based front end for a [`Session`].

#![allow(clippy::print_stdout)]

use crate::cli::help::SHELL_COMMANDS;
use crate::detection::{PreviewStyle, load_image, save_preview};
use crate::error::{Error, ErrorCategory, Result};
use crate::session::{Action, Notifier, Outcome, Phase, Session};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// `select <path>`
    Select(PathBuf),
    /// `detect`
    Detect,
    /// `preview <output>`
    Preview(PathBuf),
    /// `coords <lat> <lon>`
    Coords(String, String),
    /// `save`
    Save,
    /// `all`
    All,
    /// `explore`
    Explore,
    /// `status`
    Status,
    /// `help`
    Help,
    /// `quit`
    Quit,
    /// Blank line.
    Empty,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> std::result::Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let command = match word.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "select" | "open" => ShellCommand::Select(path_argument(rest, "select <path>")?),
        "detect" => ShellCommand::Detect,
        "preview" => ShellCommand::Preview(path_argument(rest, "preview <output>")?),
        "coords" | "map" => {
            let mut parts = rest.split(|c: char| c.is_whitespace() || c == ',');
            let mut next = || parts.find(|p| !p.is_empty()).map(str::to_string);
            match (next(), next(), next()) {
                (Some(lat), Some(lon), None) => ShellCommand::Coords(lat, lon),
                _ => return Err("usage: coords <lat> <lon>".to_string()),
            }
        }
        "save" => ShellCommand::Save,
        "all" | "list" => ShellCommand::All,
        "explore" => ShellCommand::Explore,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}', type 'help' for a list")),
    };
    Ok(command)
}

fn path_argument(rest: &str, usage: &str) -> std::result::Result<PathBuf, String> {
    let unquoted = rest.trim_matches(|c| c == '"' || c == '\'');
    if unquoted.is_empty() {
        return Err(format!("usage: {usage}"));
    }
    Ok(PathBuf::from(unquoted))
}

/// Prints session notifications to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn phase_changed(&mut self, phase: Phase, enabled: &[Action]) {
        let labels: Vec<&str> = enabled.iter().map(|a| a.label()).collect();
        println!("[{phase}] available: {}", labels.join(", "));
    }

    fn status(&mut self, message: &str) {
        println!("{message}");
    }

    fn image_changed(&mut self, image: Option<&Path>) {
        if let Some(image) = image {
            println!("Current image: {}", image.display());
        }
    }
}

/// Read commands from `input` until `quit` or end of input.
///
/// Action failures are reported on `output` and the loop continues.
pub fn run_shell<R: BufRead, W: Write>(
    session: &mut Session,
    preview: &PreviewStyle,
    mut input: R,
    output: &mut W,
) -> Result<()> {
    loop {
        write!(output, "iguanapp> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "{message}")?;
                continue;
            }
        };

        if command == ShellCommand::Quit {
            return Ok(());
        }

        if let Err(e) = execute(session, preview, command, &mut input, output) {
            match (&e, e.category()) {
                (Error::Io(_), _) => return Err(e),
                (_, ErrorCategory::InputValidation) => writeln!(output, "{e}")?,
                _ => writeln!(output, "error: {e}")?,
            }
        }
    }
}

fn execute<R: BufRead, W: Write>(
    session: &mut Session,
    preview: &PreviewStyle,
    command: ShellCommand,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    match command {
        ShellCommand::Select(path) => session.select_image(&path),
        ShellCommand::Detect => {
            let result = session.detect()?;
            if !result.is_iguana {
                writeln!(output, "Try another photo.")?;
            }
            Ok(())
        }
        ShellCommand::Preview(target) => {
            let state = session.state();
            let image = state.image().ok_or(Error::NoImageSelected)?;
            let detection = state.detection().ok_or(Error::DetectionRequired)?;
            let decoded = load_image(image)?;
            save_preview(&decoded, &detection.all_detections, preview, &target)?;
            writeln!(output, "Preview written to {}", target.display())?;
            Ok(())
        }
        ShellCommand::Coords(lat, lon) => {
            let path = session.update_map(&lat, &lon)?;
            writeln!(output, "Map: {}", path.display())?;
            Ok(())
        }
        ShellCommand::Save => {
            let mut prompt_failed = None;
            let receipt = session.save_sighting(&mut || {
                match confirm(input, output, "Delete the original image? [y/N] ") {
                    Ok(answer) => answer,
                    Err(e) => {
                        prompt_failed = Some(e);
                        false
                    }
                }
            })?;
            if let Some(e) = prompt_failed {
                return Err(e);
            }

            writeln!(
                output,
                "Saved sighting #{} ({}), archived as {}",
                receipt.id,
                receipt.coordinates,
                receipt.saved_image.display()
            )?;
            if let Some(notice) = receipt.original.notice() {
                writeln!(output, "{notice}")?;
            }
            Ok(())
        }
        ShellCommand::All => {
            // An empty store is reported through the notifier.
            if let Outcome::Shown(path) = session.show_all()? {
                writeln!(output, "Map: {}", path.display())?;
            }
            Ok(())
        }
        ShellCommand::Explore => {
            let path = session.explore_map()?;
            writeln!(output, "Map: {}", path.display())?;
            Ok(())
        }
        ShellCommand::Status => {
            writeln!(output, "Step: {}", session.phase())?;
            if let Some(image) = session.state().image() {
                writeln!(output, "Image: {}", image.display())?;
            }
            if let Some(detection) = session.state().detection() {
                writeln!(output, "Detection: {}", detection.summary())?;
            }
            if let Some(coordinates) = session.state().coordinates() {
                writeln!(output, "Location: {coordinates}")?;
            }
            let labels: Vec<&str> = session.enabled_actions().iter().map(|a| a.label()).collect();
            writeln!(output, "Available: {}", labels.join(", "))?;
            Ok(())
        }
        ShellCommand::Help => {
            for (usage, description) in SHELL_COMMANDS {
                writeln!(output, "  {usage:<20} {description}")?;
            }
            Ok(())
        }
        ShellCommand::Quit | ShellCommand::Empty => Ok(()),
    }
}

/// Ask a yes/no question; anything but `y`/`yes` is no.
fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
