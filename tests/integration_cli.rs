// Drives the compiled binary's headless commands against an isolated HOME.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;

const UPRIGHT: &str = r#"{"landmarks":{"left_shoulder":{"x":0.4,"y":0.3,"visibility":0.9},"right_shoulder":{"x":0.6,"y":0.3,"visibility":0.9},"left_hip":{"x":0.4,"y":0.7},"right_hip":{"x":0.6,"y":0.7}}}"#;

fn spineguard(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spineguard").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("SPINEGUARD_LOG");
    cmd
}

fn write_feed(dir: &Path, lines: usize) -> std::path::PathBuf {
    let mut feed = String::from("# recorded feed\n");
    for _ in 0..lines {
        feed.push_str(UPRIGHT);
        feed.push('\n');
    }
    feed.push_str("{not json\n");
    let path = dir.join("feed.jsonl");
    fs::write(&path, feed).unwrap();
    path
}

#[test]
fn replay_prints_summary_and_writes_csv() {
    let home = tempfile::tempdir().unwrap();
    let feed = write_feed(home.path(), 12);
    let csv = home.path().join("session.csv");

    let output = spineguard(home.path())
        .args(["replay", "--uncalibrated", "--feed"])
        .arg(&feed)
        .arg("--csv")
        .arg(&csv)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("frames:      12"));
    assert!(stdout.contains("readings:    12"));
    assert!(stdout.contains("final:       Good"));

    let text = fs::read_to_string(&csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Timestamp,Angle,Status"));
    assert_eq!(lines.count(), 12);
}

#[test]
fn saved_replay_shows_up_in_report_and_export() {
    let home = tempfile::tempdir().unwrap();
    let feed = write_feed(home.path(), 30);

    spineguard(home.path())
        .args(["replay", "--uncalibrated", "--save", "--feed"])
        .arg(&feed)
        .assert()
        .success();

    let report = spineguard(home.path())
        .args(["report", "--days", "3"])
        .output()
        .unwrap();
    assert!(report.status.success());
    let report = String::from_utf8(report.stdout).unwrap();
    assert!(report.starts_with("Posture Report"));
    assert!(report.contains("Sessions:       1"));
    assert!(report.contains("Days tracked:   1 of 3"));

    let export = spineguard(home.path())
        .args(["export", "--days", "2"])
        .output()
        .unwrap();
    assert!(export.status.success());
    let export = String::from_utf8(export.stdout).unwrap();
    let rows: Vec<&str> = export.lines().collect();
    assert_eq!(rows[0], "Date,Sessions,Minutes,Good,Moderate,Poor,Score");
    assert_eq!(rows.len(), 3);
    assert!(rows[2].ends_with(",30,0,0,100"));
}

#[test]
fn replay_with_missing_feed_fails() {
    let home = tempfile::tempdir().unwrap();
    spineguard(home.path())
        .args(["replay", "--feed"])
        .arg(home.path().join("missing.jsonl"))
        .assert()
        .failure();
}
