//! Integration tests for the proofbench CLI.
//!
//! These tests verify the CLI binary behavior by running the actual executable
//! and checking output and exit codes. They never touch a Docker daemon.

use assert_cmd::Command;
use predicates::prelude::*;

/// Creates a Command for the proofbench binary.
#[allow(deprecated)]
fn proofbench() -> Command {
    Command::cargo_bin("proofbench").expect("failed to find proofbench binary")
}

// -----------------------------------------------------------------------------
// Help and version tests
// -----------------------------------------------------------------------------

#[test]
fn test_help_shows_all_commands() {
    proofbench()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("proofbench"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("pull-images"));
}

#[test]
fn test_version_shows_version() {
    proofbench()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("proofbench"));
}

#[test]
fn test_serve_help_shows_all_options() {
    proofbench()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_pull_images_help_shows_language_option() {
    proofbench()
        .args(["pull-images", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--language"));
}

#[test]
fn test_unknown_subcommand_fails() {
    proofbench()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
