//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

/// Runs the binary with config and data directories isolated under `home`.
fn engagement(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("engagement").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("PORT")
        .env_remove("RUST_LOG");
    cmd
}

// === Subcommand Tests ===

#[test]
fn test_missing_subcommand_shows_usage() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("serve")
                .and(predicate::str::contains("predict"))
                .and(predicate::str::contains("models")),
        );
}

#[test]
fn test_version() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("engagement 1.0.0"));
}

// === Predict Argument Tests ===

#[test]
fn test_predict_requires_paths() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .arg("predict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required").or(predicate::str::contains("PATHS")));
}

#[test]
fn test_invalid_format_rejected() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .args(["predict", "--format", "xml", "frame.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("json").or(predicate::str::contains("jsonl")));
}

#[test]
fn test_invalid_device_rejected() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .args(["predict", "--device", "tpu", "frame.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown device"));
}

// === Serve Argument Tests ===

#[test]
fn test_serve_port_zero_rejected() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .args(["serve", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--port"));
}

#[test]
fn test_serve_port_non_numeric_rejected() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .args(["serve", "--port", "http"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn test_serve_body_limit_zero_rejected() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .args(["serve", "--max-body-bytes", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than 0"));
}

// === Verbosity Level Tests ===

#[test]
fn test_verbosity_flags_accepted_anywhere() {
    let home = tempfile::tempdir().unwrap();

    engagement(home.path())
        .args(["-vv", "models", "path"])
        .assert()
        .success();

    engagement(home.path())
        .args(["models", "path", "-v"])
        .assert()
        .success();
}
