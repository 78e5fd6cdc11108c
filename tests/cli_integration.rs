//! Integration tests for the non-interactive subcommands.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Command isolated from the user's config and data directories.
fn iguanapp(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("iguanapp");
    cmd.env("TMPDIR", dir)
        .arg("--quiet")
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--database")
        .arg(dir.join("sightings.db"))
        .arg("--archive-dir")
        .arg(dir.join("saved"))
        .arg("--model")
        .arg(dir.join("missing.onnx"));
    cmd
}

#[test]
fn test_list_empty_database() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sightings saved yet."));

    assert!(dir.path().join("sightings.db").exists());
}

#[test]
fn test_list_json_empty_database() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_map_all_without_sightings() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["map", "all", "--no-open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sightings saved yet."));
}

#[test]
fn test_map_explore_writes_document() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["map", "explore", "--no-open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("iguanapp_map_").and(predicate::str::contains(".html")));
}

#[test]
fn test_map_point_unknown_id() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["map", "point", "7", "--no-open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no sighting with id 7"));
}

#[test]
fn test_archive_stats_on_new_directory() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .arg("archive")
        .assert()
        .success()
        .stdout(predicate::str::contains("Files:    0"))
        .stdout(predicate::str::contains("0.00 MB"));

    assert!(dir.path().join("saved").is_dir());
}

#[test]
fn test_detect_without_model_shows_setup_help() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["detect", "photo.jpg"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("iguanapp config init"))
        .stderr(predicate::str::contains("model file does not exist"));
}

#[test]
fn test_record_without_model_fails_before_saving() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["record", "photo.jpg", "--lat", "9.0", "--lon", "-80.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("model file does not exist"));
}

#[test]
fn test_invalid_min_confidence_rejected() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["-c", "1.5", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0.0 and 1.0"));
}

#[test]
fn test_config_path_honours_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    iguanapp(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config.display().to_string()));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();

    iguanapp(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(dir.path().join("config.toml").exists());

    iguanapp(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    iguanapp(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[model]"))
        .stdout(predicate::str::contains("min_confidence"));
}
