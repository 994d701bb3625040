//! Integration tests for the scanval binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn scan_finds_amount_and_date() {
    let input = write_temp("paid 5€ on 2020-01-01");

    Command::cargo_bin("scanval")
        .unwrap()
        .args(["scan", "--format", "json", "--no-progress"])
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("5€"))
        .stdout(predicate::str::contains("EUR"))
        .stdout(predicate::str::contains("2020-01-01"));
}

#[test]
fn scan_with_known_identifiers() {
    let input = write_temp("ref FV/OO1/2024");
    let ids = write_temp("FV/001/2024\n");

    Command::cargo_bin("scanval")
        .unwrap()
        .args(["scan", "--detectors", "identifier", "--format", "json", "--no-progress"])
        .arg("--known-ids")
        .arg(ids.path())
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("FV/001/2024"));
}

#[test]
fn scan_missing_file_fails() {
    Command::cargo_bin("scanval")
        .unwrap()
        .args(["scan", "/nonexistent/input.txt", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn config_init_and_show_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    Command::cargo_bin("scanval")
        .unwrap()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();

    assert!(path.exists());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("max_distance"));
}
