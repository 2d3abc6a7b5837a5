//! Integration tests for the mirrorsync binary

mod common;

use common::{assert_converged, populate_source, write_file, TestTrees};

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn mirrorsync() -> Command {
    Command::cargo_bin("mirrorsync").unwrap()
}

#[test]
fn test_help_output() {
    mirrorsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mirror a source directory"));
}

#[test]
fn test_version_output() {
    mirrorsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mirrorsync"));
}

#[test]
fn test_no_arguments_prints_usage() {
    mirrorsync()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_too_few_arguments() {
    mirrorsync()
        .args(["/src", "/replica", "30"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_too_many_arguments() {
    mirrorsync()
        .args(["/src", "/replica", "30", "/log", "extra"])
        .assert()
        .code(1);
}

#[test]
fn test_non_numeric_interval() {
    let trees = TestTrees::new();
    mirrorsync()
        .arg(&trees.source)
        .arg(&trees.replica)
        .arg("soon")
        .arg(trees.log_path())
        .assert()
        .code(1);
}

#[test]
fn test_missing_source() {
    let trees = TestTrees::new();
    mirrorsync()
        .arg(trees.temp.path().join("nonexistent"))
        .arg(&trees.replica)
        .arg("1")
        .arg(trees.log_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source directory does not exist"));
}

#[test]
fn test_single_pass_mirrors_and_logs() {
    let trees = TestTrees::new();
    populate_source(&trees.source);
    write_file(&trees.replica, "old.txt", "old");

    mirrorsync()
        .arg(&trees.source)
        .arg(&trees.replica)
        .arg("1")
        .arg(trees.log_path())
        .args(["--passes", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting synchronization"))
        .stdout(predicate::str::contains("Synchronization completed"))
        .stdout(predicate::str::contains("Deleting "));

    assert_converged(&trees);

    let log = fs::read_to_string(trees.log_path()).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert!(lines.first().unwrap().ends_with("] Starting synchronization"));
    assert!(lines.last().unwrap().ends_with("] Synchronization completed"));
    assert!(lines.iter().all(|line| line.starts_with('[')));
}

#[test]
fn test_log_file_is_appended_across_runs() {
    let trees = TestTrees::new();
    write_file(&trees.source, "a.txt", "a");

    for _ in 0..2 {
        mirrorsync()
            .arg(&trees.source)
            .arg(&trees.replica)
            .arg("1")
            .arg(trees.log_path())
            .args(["--passes", "1"])
            .assert()
            .success();
    }

    let log = fs::read_to_string(trees.log_path()).unwrap();
    assert_eq!(log.matches("Starting synchronization").count(), 2);
    assert_eq!(log.matches("Copying ").count(), 1);
}

#[test]
fn test_missing_replica_is_created() {
    let trees = TestTrees::new();
    write_file(&trees.source, "a.txt", "a");
    let replica = trees.temp.path().join("fresh_replica");

    mirrorsync()
        .arg(&trees.source)
        .arg(&replica)
        .arg("1")
        .arg(trees.log_path())
        .args(["--passes", "1"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(replica.join("a.txt")).unwrap(), "a");
}

#[test]
fn test_dry_run_leaves_replica_untouched() {
    let trees = TestTrees::new();
    write_file(&trees.source, "new.txt", "new");
    write_file(&trees.replica, "old.txt", "old");

    mirrorsync()
        .arg(&trees.source)
        .arg(&trees.replica)
        .arg("1")
        .arg(trees.log_path())
        .args(["--passes", "1", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(dry run)"));

    assert!(!trees.replica.join("new.txt").exists());
    assert!(trees.replica.join("old.txt").exists());
}

#[test]
fn test_nested_replica_is_rejected() {
    let trees = TestTrees::new();
    mirrorsync()
        .arg(&trees.source)
        .arg(trees.source.join("replica"))
        .arg("1")
        .arg(trees.log_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be nested"));
}
