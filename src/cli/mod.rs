//! CLI argument parsing and command handling.

mod args;
pub mod help;
pub mod progress;

pub use args::{Cli, Command, ConfigAction, GlobalArgs, ListFormat, MapCommand};
