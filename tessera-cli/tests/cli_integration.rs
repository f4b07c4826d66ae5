//! CLI integration tests for tessera-cli.
//!
//! These tests verify the CLI behavior by running the actual binary
//! and checking outputs, exit codes, and file artifacts. Commands that need a
//! server are pointed at a closed local port.

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use tessera_core::{encode_png, load_capture, read_payload, RqrrDecoder, PATTERN_SIZE};

/// Nothing listens here, so connections are refused immediately.
const DEAD_SERVER: &str = "http://127.0.0.1:1";

const UNIQUE_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

/// Get a Command for the tessera binary.
fn tessera() -> Command {
    let mut cmd = Command::cargo_bin("tessera").unwrap();
    cmd.env_remove("TESSERA_API_URL");
    cmd
}

/// Write a deterministic 48x48 grayscale pattern and return its path.
fn write_pattern(temp: &TempDir) -> std::path::PathBuf {
    let pattern = GrayImage::from_fn(PATTERN_SIZE, PATTERN_SIZE, |x, y| {
        Luma([((x * 37 + y * 91 + x * y * 13) % 256) as u8])
    });
    let path = temp.path().join("pattern.png");
    fs::write(&path, encode_png(&pattern).unwrap()).unwrap();
    path
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    tessera()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Copy-detection-pattern product authentication",
        ))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("pattern"))
        .stdout(predicate::str::contains("embed"));
}

#[test]
fn test_version_displays_version() {
    tessera()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tessera"));
}

#[test]
fn test_help_shows_exit_codes() {
    tessera()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("75"));
}

#[test]
fn test_help_shows_global_options() {
    tessera()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--quiet"))
        .stdout(predicate::str::contains("TESSERA_API_URL"));
}

#[test]
fn test_create_help_shows_options() {
    tessera()
        .args(["create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--name"))
        .stdout(predicate::str::contains("--company"))
        .stdout(predicate::str::contains("--output-dir"));
}

#[test]
fn test_embed_help_shows_options() {
    tessera()
        .args(["embed", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--pattern"))
        .stdout(predicate::str::contains("--id"))
        .stdout(predicate::str::contains("--module-px"));
}

#[test]
fn test_create_requires_names() {
    tessera()
        .args(["create", "--name", "Widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--company"));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_verify_missing_file_returns_input_error() {
    // Exit code 66 = EX_NOINPUT
    tessera()
        .args(["--server", DEAD_SERVER, "verify", "nonexistent_photo.png"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_verify_unreachable_server_returns_network_error() {
    let temp = TempDir::new().unwrap();
    let photo = temp.path().join("photo.png");
    fs::write(&photo, b"not really a photo").unwrap();

    // Exit code 69 = EX_UNAVAILABLE
    tessera()
        .args(["--server", DEAD_SERVER, "verify", photo.to_str().unwrap()])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Cannot reach server"));
}

#[test]
fn test_create_unreachable_server_returns_network_error() {
    let temp = TempDir::new().unwrap();

    tessera()
        .env("TESSERA_API_URL", DEAD_SERVER)
        .args([
            "create",
            "--name",
            "Widget",
            "--company",
            "Acme",
            "--output-dir",
            temp.path().to_str().unwrap(),
        ])
        .assert()
        .code(69);

    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_embed_missing_pattern_returns_input_error() {
    tessera()
        .args(["embed", "--pattern", "missing.png", "--id", UNIQUE_ID])
        .assert()
        .code(66);
}

#[test]
fn test_embed_rejects_wrong_pattern_size() {
    let temp = TempDir::new().unwrap();
    let pattern = temp.path().join("small.png");
    fs::write(
        &pattern,
        encode_png(&GrayImage::from_pixel(16, 16, Luma([128]))).unwrap(),
    )
    .unwrap();

    tessera()
        .args([
            "embed",
            "--pattern",
            pattern.to_str().unwrap(),
            "--id",
            UNIQUE_ID,
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid pattern file"));
}

// ============================================================================
// Offline Embedding Tests
// ============================================================================

#[test]
fn test_embed_writes_scannable_code() {
    let temp = TempDir::new().unwrap();
    let pattern = write_pattern(&temp);
    let output = temp.path().join("code.png");

    tessera()
        .args([
            "embed",
            "--pattern",
            pattern.to_str().unwrap(),
            "--id",
            UNIQUE_ID,
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pattern embedded"));

    let composite = load_capture(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(read_payload(&RqrrDecoder, &composite).unwrap(), UNIQUE_ID);
}

#[test]
fn test_embed_quiet_prints_nothing() {
    let temp = TempDir::new().unwrap();
    let pattern = write_pattern(&temp);
    let output = temp.path().join("code.png");

    tessera()
        .args([
            "--quiet",
            "embed",
            "--pattern",
            pattern.to_str().unwrap(),
            "--id",
            UNIQUE_ID,
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(output.exists());
}

#[test]
fn test_embed_default_output_name() {
    let temp = TempDir::new().unwrap();
    write_pattern(&temp);

    tessera()
        .current_dir(temp.path())
        .args(["-q", "embed", "--pattern", "pattern.png", "--id", UNIQUE_ID])
        .assert()
        .success();

    assert!(temp.path().join("0f8fad5b_code.png").exists());
}

#[test]
fn test_embed_unwritable_output_returns_io_error() {
    let temp = TempDir::new().unwrap();
    let pattern = write_pattern(&temp);
    let output = temp.path().join("no_such_dir").join("code.png");

    // Exit code 74 = EX_IOERR
    tessera()
        .args([
            "embed",
            "--pattern",
            pattern.to_str().unwrap(),
            "--id",
            UNIQUE_ID,
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .code(74)
        .stderr(predicate::str::contains("Failed to write"));
}
