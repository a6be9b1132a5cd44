//! Integration tests for the nettoggle binary
//!
//! Only commands that never change adapter state are exercised here.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn nettoggle() -> Command {
    Command::cargo_bin("nettoggle").unwrap()
}

/// Write a config file so the host's /etc config never leaks in
fn config_file(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("nettoggle.toml");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_command() {
    nettoggle()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Network adapter switch"))
        .stdout(predicate::str::contains("pulse"));
}

#[test]
fn test_short_duration_flag_rejected() {
    nettoggle()
        .args(["--duration", "3", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 5 seconds"));
}

#[test]
fn test_unknown_mode_rejected() {
    nettoggle()
        .args(["--mode", "sideways", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown input mode"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir, "poll_interval_ms = 0\n");

    nettoggle()
        .args(["--config", &config, "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("poll_interval_ms"));
}

#[test]
fn test_pulse_rejects_short_duration_before_touching_anything() {
    let dir = TempDir::new().unwrap();
    let config = config_file(&dir, "");

    nettoggle()
        .args(["--config", &config, "pulse", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 5 seconds"));
}

#[test]
fn test_status_json() {
    if !std::path::Path::new("/sys/class/net").exists() {
        eprintln!("Skipping: /sys/class/net not available");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config = config_file(&dir, "excluded_interfaces = []\n");

    let output = nettoggle()
        .args(["--config", &config, "status", "--json"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    for row in rows {
        assert!(row["id"].is_string());
        assert!(row["state"].is_string());
    }
}
