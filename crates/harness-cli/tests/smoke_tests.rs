//! Smoke tests for the demoqa CLI
//!
//! These run the binary without a browser: help, listing and configuration.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the demoqa binary, isolated from the caller's environment
fn demoqa() -> Command {
    let mut cmd = Command::cargo_bin("demoqa").expect("demoqa binary should exist");
    for var in ["BROWSER", "HEADLESS", "BASE_URL", "LOG_LEVEL", "EXPLICIT_WAIT"] {
        cmd.env_remove(var);
    }
    cmd
}

const FEATURE: &str = r#"Feature: Elements

  Background:
    Given the user has launched the DEMOQA application

  @smoke
  Scenario: TC_EL_01 - Elements card
    When the user clicks on "Elements" card
    Then the user should be navigated to a URL containing "demoqa.com/elements"

  @wip
  Scenario: TC_EL_02 - Parked
    When the user clicks on "Forms" card
"#;

fn workspace_with(feature: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("features")).unwrap();
    fs::write(dir.path().join("features").join("elements.feature"), feature).unwrap();
    dir
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    demoqa()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    demoqa()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_shows_help() {
    demoqa().assert().failure();
}

#[test]
fn test_run_subcommand_help() {
    demoqa()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--tags"))
        .stdout(predicate::str::contains("--headless"))
        .stdout(predicate::str::contains("--base-url"));
}

// ============================================================================
// List
// ============================================================================

#[test]
fn test_list_default_directory() {
    let dir = workspace_with(FEATURE);
    demoqa()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("TC_EL_01 - Elements card @smoke"))
        .stdout(predicate::str::contains("TC_EL_02 - Parked @wip (skipped)"))
        .stdout(predicate::str::contains("2 scenarios in 1 feature files"));
}

#[test]
fn test_list_with_tag_filter() {
    let dir = workspace_with(FEATURE);
    demoqa()
        .current_dir(dir.path())
        .args(["list", "--tags", "smoke"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TC_EL_01"))
        .stdout(predicate::str::contains("TC_EL_02").not());
}

#[test]
fn test_list_verbose_shows_steps() {
    let dir = workspace_with(FEATURE);
    demoqa()
        .current_dir(dir.path())
        .args(["list", "-v", "--name", "elements card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Given the user has launched the DEMOQA application"));
}

#[test]
fn test_list_reports_undefined_steps() {
    let dir = workspace_with(
        "Feature: F\n  Scenario: TC_X_01 - Unknown\n    Given the user dances\n",
    );
    demoqa()
        .current_dir(dir.path())
        .args(["list", "--color", "never"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Undefined step in TC_X_01"));
}

#[test]
fn test_list_missing_path_fails() {
    let dir = TempDir::new().unwrap();
    demoqa()
        .current_dir(dir.path())
        .args(["list", "nowhere"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nowhere"));
}

#[cfg(not(feature = "browser"))]
#[test]
fn test_run_without_browser_support_is_a_config_error() {
    let dir = workspace_with(FEATURE);
    demoqa()
        .current_dir(dir.path())
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("browser support not enabled"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_prints_json() {
    let output = demoqa()
        .env("HEADLESS", "true")
        .args(["config", "--base-url", "http://localhost:3000/"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["headless"], true);
    assert_eq!(json["base_url"], "http://localhost:3000");
    assert_eq!(json["browser"], "chrome");
}

#[test]
fn test_config_headed_overrides_environment() {
    let output = demoqa()
        .env("HEADLESS", "true")
        .args(["config", "--headed"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["headless"], false);
}

#[test]
fn test_config_rejects_firefox() {
    demoqa()
        .env("BROWSER", "firefox")
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("firefox"));
}
