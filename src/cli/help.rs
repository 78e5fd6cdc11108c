//! Help text for the interactive shell and first-time setup.

#![allow(clippy::print_stdout)]

use std::path::Path;

/// Commands understood by the shell, with their usage and description.
pub const SHELL_COMMANDS: &[(&str, &str)] = &[
    ("select <path>", "select a photo of the sighting"),
    ("detect", "run iguana detection on the selected photo"),
    ("preview <output>", "save the photo with detection boxes drawn"),
    ("coords <lat> <lon>", "validate coordinates and show them on a map"),
    ("save", "archive the photo and record the sighting"),
    ("all", "map every saved sighting"),
    ("explore", "open an empty map to look up coordinates"),
    ("status", "show the current step and available commands"),
    ("help", "show this list"),
    ("quit", "leave the session"),
];

/// Greeting printed when the shell starts.
pub fn print_shell_banner() {
    println!("iguanapp {}: green iguana sighting recorder", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Tip: use 4 decimal places for latitude and longitude (e.g. 8.9943 -79.5188).");
    println!("Type 'help' for commands.");
    println!();
}

/// Setup guide shown when the detection model is missing.
pub fn print_first_time_help(model_path: &Path) {
    println!("No detection model found at {}.", model_path.display());
    println!();
    println!("1. Initialize configuration:");
    println!("   iguanapp config init");
    println!();
    println!("2. Export your trained YOLO weights to ONNX, for example:");
    println!("   yolo export model=best.pt format=onnx imgsz=640");
    println!();
    println!("3. Point iguanapp at the exported file, either in the config file:");
    println!("   [model]");
    println!("   path = \"/path/to/best.onnx\"");
    println!("   or with --model /path/to/best.onnx (or IGUANAPP_MODEL).");
    println!();
    println!("ONNX Runtime must be installed; set ORT_DYLIB_PATH if it is not on the");
    println!("library search path.");
    println!();
    println!("Run 'iguanapp -h' for all options.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shell_command_is_documented_once() {
        let mut names: Vec<&str> = SHELL_COMMANDS
            .iter()
            .map(|(usage, _)| usage.split_whitespace().next().unwrap_or_default())
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"coords"));
        assert!(names.contains(&"quit"));
    }
}
