//! The `debate` binary rejects bad topics before touching the filesystem.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_short_topic_fails_without_creating_log() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    let mut cmd = cargo_bin_cmd!("debate");
    cmd.args(["--topic", "AI", "--log-path"])
        .arg(&log_dir)
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Topic is too short"));

    assert!(!log_dir.exists());
}

#[test]
fn test_prompted_topic_is_sanitized_before_validation() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    // Only disallowed characters: nothing survives sanitizing.
    let mut cmd = cargo_bin_cmd!("debate");
    cmd.arg("--log-path")
        .arg(&log_dir)
        .current_dir(dir.path())
        .write_stdin("<<>>!!\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter debate topic:"))
        .stderr(predicate::str::contains("got 0"));

    assert!(!log_dir.exists());
}
