//! Tests for the `statute-reader` binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("forsakringslag")
        .join(name)
}

fn statute_reader() -> Command {
    Command::cargo_bin("statute-reader").unwrap()
}

#[test]
fn test_extract_writes_yaml() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("law.yaml");

    statute_reader()
        .args(["extract", "--text"])
        .arg(fixture("content.txt"))
        .args(["--name", "Lag om försäkring", "--effective-date", "2026-01-01", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Paragraphs: 5"))
        .stdout(predicate::str::contains("1 kept, 1 dropped"))
        .stdout(predicate::str::contains("Saved to:"));

    let yaml = fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("100 kronor"));
    assert!(!yaml.contains("200 kronor"));
}

#[test]
fn test_extract_rejects_invalid_date() {
    statute_reader()
        .args(["extract", "--html"])
        .arg(fixture("content.xhtml"))
        .args(["--effective-date", "2026-02-30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_validate_reports_unresolved_marker() {
    statute_reader()
        .args(["validate", "--html"])
        .arg(fixture("content.xhtml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Unresolved: 1"))
        .stdout(predicate::str::contains("Invalid: 0"));
}

#[test]
fn test_schedule_with_reference_date() {
    statute_reader()
        .args(["schedule", "--text"])
        .arg(fixture("content.txt"))
        .args(["--date", "2026-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dated transitions: 2 (2 upcoming)"))
        .stdout(predicate::str::contains("2028-07-01"));
}

#[test]
fn test_reconcile_with_allow_list() {
    let dir = tempdir().unwrap();
    let allow_list = dir.path().join("allowed.txt");
    fs::write(
        &allow_list,
        "# decided by government, not yet dated\nparagraph_periodisering_unresolved:K2 P2#V1\n",
    )
    .unwrap();
    let output = dir.path().join("report.yaml");

    statute_reader()
        .arg("reconcile")
        .arg("--html")
        .arg(fixture("content.xhtml"))
        .arg("--text")
        .arg(fixture("content.txt"))
        .arg("--allow-list")
        .arg(&allow_list)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Findings: 0"));

    let yaml = fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("finding_count: 0"));
}

#[test]
fn test_reconcile_prints_findings() {
    statute_reader()
        .arg("reconcile")
        .arg("--html")
        .arg(fixture("content.xhtml"))
        .arg("--text")
        .arg(fixture("content.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "- [LOW] paragraph_periodisering_unresolved key=paragraph_periodisering_unresolved:K2 P2#V1",
        ));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().unwrap();
    statute_reader()
        .args(["validate", "--text"])
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}
