//! Integration tests for the `blackout` CLI binary.
//!
//! Each test points `--snapshot` at a fresh temporary directory and drives the
//! binary through `assert_cmd`, checking both stdout JSON and what lands in the
//! snapshot file.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper: path to the calendar.ics fixture.
fn calendar_ics_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/calendar.ics")
}

fn snapshot_in(dir: &TempDir) -> PathBuf {
    dir.path().join("schedule.json")
}

/// Helper: a `blackout` command bound to `snapshot`.
fn blackout(snapshot: &Path) -> Command {
    let mut cmd = Command::cargo_bin("blackout").unwrap();
    cmd.env_remove("BLACKOUT_SNAPSHOT")
        .env_remove("RUST_LOG")
        .arg("--snapshot")
        .arg(snapshot);
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout must be JSON")
}

// ─────────────────────────────────────────────────────────────────────────────
// Calendar
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn import_writes_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);

    blackout(&snapshot)
        .args(["import", "-i", calendar_ics_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"events\": 2"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(stored["calendar"]["events"][0]["kind"], "recurring");
    assert_eq!(stored["calendar"]["events"][1]["kind"], "single");
}

#[test]
fn import_from_stdin() {
    let dir = TempDir::new().unwrap();
    let ics = std::fs::read_to_string(calendar_ics_path()).unwrap();

    blackout(&snapshot_in(&dir))
        .arg("import")
        .write_stdin(ics)
        .assert()
        .success();
}

#[test]
fn import_rejects_malformed_calendar() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);

    blackout(&snapshot)
        .arg("import")
        .write_stdin("BEGIN:VCALENDAR\nBEGIN:VEVENT\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be parsed"));

    assert!(!snapshot.exists(), "failed import must not write a snapshot");
}

#[test]
fn events_lists_named_occurrences() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);
    blackout(&snapshot)
        .args(["import", "-i", calendar_ics_path()])
        .assert()
        .success();

    let events = stdout_json(blackout(&snapshot).args([
        "events",
        "--start",
        "2024-07-01T09:00",
        "--end",
        "2024-07-02T12:00",
    ]));

    let names: Vec<_> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Quiet hours", "Filament delivery", "Quiet hours"]);
}

#[test]
fn events_rejects_periods_over_a_year() {
    let dir = TempDir::new().unwrap();

    blackout(&snapshot_in(&dir))
        .args(["events", "--start", "2024-01-01", "--end", "2025-06-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("over 365 days"));
}

#[test]
fn add_event_with_rule_and_stop() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);

    blackout(&snapshot)
        .args([
            "add-event",
            "--start",
            "2024-07-01T00:00",
            "--end",
            "2024-07-01T06:00",
            "--name",
            "night",
            "--rrule",
            "FREQ=DAILY",
            "--stop",
            "2024-07-02T12:00",
        ])
        .assert()
        .success();

    let events = stdout_json(blackout(&snapshot).args([
        "events",
        "--start",
        "2024-07-01T00:00",
        "--end",
        "2024-07-05T00:00",
    ]));
    assert_eq!(events.as_array().unwrap().len(), 2);
}

#[test]
fn add_event_rejects_reversed_edges() {
    let dir = TempDir::new().unwrap();

    blackout(&snapshot_in(&dir))
        .args([
            "add-event",
            "--start",
            "2024-07-01T06:00",
            "--end",
            "2024-07-01T05:00",
        ])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Exclusions and availability
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn exclusion_reopens_time_until_reset() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);
    blackout(&snapshot)
        .args([
            "add-event",
            "--start",
            "2024-07-01T09:00:00Z",
            "--end",
            "2024-07-01T12:00:00Z",
        ])
        .assert()
        .success();
    blackout(&snapshot)
        .args([
            "exclude",
            "--start",
            "2024-07-01T10:00",
            "--end",
            "2024-07-01T11:00",
        ])
        .assert()
        .success();

    let available = |snapshot: &Path| {
        stdout_json(blackout(snapshot).args([
            "available",
            "--start",
            "2024-07-01T08:00",
            "--duration",
            "06:00",
        ]))
    };

    assert_eq!(available(&snapshot).as_array().unwrap().len(), 3);

    let exclusions = stdout_json(blackout(&snapshot).args([
        "exclusions",
        "--start",
        "2024-07-01T00:00",
        "--end",
        "2024-07-02T12:00",
    ]));
    assert_eq!(exclusions[0]["start"], "2024-07-01T10:00:00Z");

    blackout(&snapshot).arg("reset").assert().success();
    assert_eq!(available(&snapshot).as_array().unwrap().len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Jobs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn add_and_remove_jobs() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);

    let first = stdout_json(blackout(&snapshot).args(["add-job", "--name", "benchy", "--duration", "01:30"]));
    let second = stdout_json(blackout(&snapshot).args(["add-job", "--name", "vase", "--duration", "05:00"]));
    assert_eq!(first["id"], 1);
    assert_eq!(second["id"], 2);

    let removed = stdout_json(blackout(&snapshot).args(["remove-job", "1"]));
    assert_eq!(removed["count"], 1);

    let jobs = stdout_json(blackout(&snapshot).arg("jobs"));
    let jobs = jobs["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["name"], "vase");
    assert_eq!(jobs[0]["duration"], 5 * 3600);

    // Ids survive a reload and are not reused.
    let third = stdout_json(blackout(&snapshot).args(["add-job", "--name", "clip", "--duration", "00:10"]));
    assert_eq!(third["id"], 3);
}

#[test]
fn remove_unknown_job_reports_zero() {
    let dir = TempDir::new().unwrap();
    let removed = stdout_json(blackout(&snapshot_in(&dir)).args(["remove-job", "7"]));
    assert_eq!(removed["count"], 0);
}

#[test]
fn add_job_rejects_bad_duration() {
    let dir = TempDir::new().unwrap();

    blackout(&snapshot_in(&dir))
        .args(["add-job", "--name", "x", "--duration", "90 minutes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HH:MM"));
}

#[test]
fn suggest_orders_by_duration_and_respects_blackout() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);
    blackout(&snapshot)
        .args([
            "add-event",
            "--start",
            "2024-07-01T09:00",
            "--end",
            "2024-07-01T12:00",
        ])
        .assert()
        .success();
    blackout(&snapshot)
        .args(["add-job", "--name", "short", "--duration", "01:00"])
        .assert()
        .success();
    blackout(&snapshot)
        .args(["add-job", "--name", "long", "--duration", "02:00"])
        .assert()
        .success();

    let early = stdout_json(blackout(&snapshot).args(["suggest", "--at", "2024-07-01T06:00"]));
    let names: Vec<_> = early
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["long", "short"]);

    let blocked = stdout_json(blackout(&snapshot).args(["suggest", "--at", "2024-07-01T10:00"]));
    assert!(blocked.as_array().unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn corrupt_snapshot_is_reported() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);
    std::fs::write(&snapshot, "not json").unwrap();

    blackout(&snapshot)
        .arg("jobs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load snapshot"));
}

#[test]
fn snapshot_path_from_environment() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);

    Command::cargo_bin("blackout")
        .unwrap()
        .env("BLACKOUT_SNAPSHOT", &snapshot)
        .args(["add-job", "--name", "env", "--duration", "00:30"])
        .assert()
        .success();

    assert!(snapshot.exists());
}

#[test]
fn read_only_commands_do_not_create_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = snapshot_in(&dir);

    blackout(&snapshot).arg("jobs").assert().success();
    assert!(!snapshot.exists());
}
