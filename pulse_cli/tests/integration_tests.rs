//! Integration tests for the pulse binary.
//!
//! These tests verify end-to-end behavior including:
//! - Profile creation, login, listing and deletion
//! - Logging workouts and moving along step ladders
//! - Export, import and reset
//! - Persistence across invocations

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory with an empty config file
fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("config.toml"), "").expect("Failed to write config");
    dir
}

/// CLI bound to an isolated data directory and config
fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pulse"));
    cmd.arg("--data-dir")
        .arg(dir.path().join("data"))
        .arg("--config")
        .arg(dir.path().join("config.toml"));
    cmd
}

fn create_user(dir: &TempDir, name: &str) {
    cli(dir).args(["user", "create", name]).assert().success();
}

fn export_json(dir: &TempDir) -> Value {
    let output = cli(dir)
        .args(["export", "--stdout"])
        .output()
        .expect("Failed to run export");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("Export is not valid JSON")
}

fn user_record_count(dir: &Path) -> usize {
    fs::read_dir(dir.join("data/users"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |x| x == "json"))
        .count()
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("pulse"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Celestial Pulse calisthenics progress tracker",
        ));
}

#[test]
fn test_create_user_persists_record() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["user", "create", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created profile 'alice'"));

    assert_eq!(user_record_count(temp_dir.path()), 1);
    assert!(temp_dir.path().join("data/session.json").exists());
}

#[test]
fn test_create_user_validation_and_duplicates() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["user", "create", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Username cannot be empty"));

    cli(&temp_dir)
        .args(["user", "create", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 2 characters"));

    create_user(&temp_dir, "ab");

    cli(&temp_dir)
        .args(["user", "create", "ab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Username already exists"));

    assert_eq!(user_record_count(temp_dir.path()), 1);
}

#[test]
fn test_login_unknown_user_fails() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["user", "login", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User not found"));
}

#[test]
fn test_log_movement_awards_xp() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");

    cli(&temp_dir)
        .args(["log", "movement", "pushup", "--sets", "3", "--reps", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Full pushup (3x8)"))
        .stdout(predicate::str::contains("+240 XP"));

    let doc = export_json(&temp_dir);
    assert_eq!(doc["xp"], 240);
    assert_eq!(doc["logs"].as_array().unwrap().len(), 1);
    assert_eq!(doc["logs"][0]["type"], "movement");
    assert_eq!(doc["logs"][0]["stepIndex"], 4);
}

#[test]
fn test_log_uses_config_defaults() {
    let temp_dir = setup_test_dir();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[defaults]\nsets = 2\nreps = 5\ncardio_minutes = 15\n",
    )
    .unwrap();
    create_user(&temp_dir, "alice");

    cli(&temp_dir)
        .args(["log", "movement", "squat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(2x5)"));
    cli(&temp_dir)
        .args(["log", "cardio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cardio 15 min"));

    // 10 xp * 2 * 5 + 15
    assert_eq!(export_json(&temp_dir)["xp"], 115);
}

#[test]
fn test_log_skill_and_cardio() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");

    cli(&temp_dir)
        .args(["log", "skill", "lsit", "--notes", "15s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+8 XP"));
    cli(&temp_dir)
        .args(["log", "cardio", "45.7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cardio 45 min"));

    let doc = export_json(&temp_dir);
    assert_eq!(doc["xp"], 53);
    // Most recent first
    assert_eq!(doc["logs"][0]["type"], "cardio");
    assert_eq!(doc["logs"][1]["notes"], "15s");
}

#[test]
fn test_log_unknown_movement_fails() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");

    cli(&temp_dir)
        .args(["log", "movement", "deadlift"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown movement"));
}

#[test]
fn test_log_without_login_fails() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["log", "cardio", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No user is logged in"));
}

#[test]
fn test_step_clamps_at_boundaries() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");

    // hollow_hold starts at step 2 of 3
    for _ in 0..4 {
        cli(&temp_dir)
            .args(["step", "hollow_hold", "up"])
            .assert()
            .success();
    }
    cli(&temp_dir)
        .args(["step", "hollow_hold", "up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("step 3/3 Advanced hollow hold"));

    for _ in 0..5 {
        cli(&temp_dir)
            .args(["step", "pushup", "down"])
            .assert()
            .success();
    }
    let doc = export_json(&temp_dir);
    assert_eq!(doc["currentStepBySkill"]["hollow_hold"], 2);
    assert_eq!(doc["currentStepByMovement"]["pushup"], 0);
}

#[test]
fn test_status_shows_level_and_week() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");
    cli(&temp_dir)
        .args(["log", "cardio", "120"])
        .assert()
        .success();

    cli(&temp_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total XP: 120"))
        .stdout(predicate::str::contains("Level: 2"))
        .stdout(predicate::str::contains("Cardio    120/120 minutes    100%"))
        .stdout(predicate::str::contains("Full pushup"));
}

#[test]
fn test_users_keep_independent_progress() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");
    cli(&temp_dir)
        .args(["log", "cardio", "30"])
        .assert()
        .success();

    create_user(&temp_dir, "bob");
    assert_eq!(export_json(&temp_dir)["xp"], 0);

    cli(&temp_dir)
        .args(["user", "login", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30 XP"));
    assert_eq!(export_json(&temp_dir)["xp"], 30);
}

#[test]
fn test_user_list_most_recent_first() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");
    create_user(&temp_dir, "bob");
    cli(&temp_dir)
        .args(["user", "login", "alice"])
        .assert()
        .success();

    let output = cli(&temp_dir).args(["user", "list"]).output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("* alice"), "got {:?}", lines);
    assert!(lines[1].contains("bob"));
}

#[test]
fn test_delete_requires_confirmation() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");

    cli(&temp_dir)
        .args(["user", "delete", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(user_record_count(temp_dir.path()), 1);

    cli(&temp_dir)
        .args(["user", "delete", "alice", "--yes"])
        .assert()
        .success();
    assert_eq!(user_record_count(temp_dir.path()), 0);

    // Deleting the active user ends the session
    assert!(!temp_dir.path().join("data/session.json").exists());
    cli(&temp_dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No user is logged in"));
}

#[test]
fn test_logout() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");

    cli(&temp_dir)
        .args(["user", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out 'alice'"));
    cli(&temp_dir)
        .arg("status")
        .assert()
        .failure();
}

#[test]
fn test_export_import_roundtrip() {
    let temp_dir = setup_test_dir();
    let export_dir = temp_dir.path().join("exports");
    create_user(&temp_dir, "alice");
    cli(&temp_dir)
        .args(["log", "movement", "bridge", "--sets", "2", "--reps", "10"])
        .assert()
        .success();
    cli(&temp_dir)
        .args(["log", "skill", "front_lever"])
        .assert()
        .success();

    cli(&temp_dir)
        .arg("export")
        .arg("--out")
        .arg(&export_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("celestial-pulse-alice-"));

    let exported: Vec<_> = fs::read_dir(&export_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(exported.len(), 1);
    let expected_name = format!(
        "celestial-pulse-alice-{}.json",
        chrono::Utc::now().date_naive().format("%Y-%m-%d")
    );
    assert!(exported[0].ends_with(&expected_name));
    let before = export_json(&temp_dir);

    cli(&temp_dir).args(["reset", "--yes"]).assert().success();
    assert_eq!(export_json(&temp_dir)["xp"], 0);

    cli(&temp_dir)
        .arg("import")
        .arg(&exported[0])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 logs"));

    assert_eq!(export_json(&temp_dir), before);
}

#[test]
fn test_import_invalid_json_keeps_state() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");
    cli(&temp_dir)
        .args(["log", "cardio", "20"])
        .assert()
        .success();

    let bad = temp_dir.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();

    cli(&temp_dir)
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid import document"));

    assert_eq!(export_json(&temp_dir)["xp"], 20);
}

#[test]
fn test_reset_requires_confirmation() {
    let temp_dir = setup_test_dir();
    create_user(&temp_dir, "alice");
    cli(&temp_dir)
        .args(["log", "cardio", "20"])
        .assert()
        .success();

    cli(&temp_dir)
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(export_json(&temp_dir)["xp"], 20);

    cli(&temp_dir).args(["reset", "--yes"]).assert().success();
    let doc = export_json(&temp_dir);
    assert_eq!(doc["xp"], 0);
    assert_eq!(doc["currentStepByMovement"]["pullup"], 3);
}

#[test]
fn test_history_csv() {
    let temp_dir = setup_test_dir();
    let csv_path = temp_dir.path().join("history.csv");
    create_user(&temp_dir, "alice");
    for minutes in ["10", "20", "30"] {
        cli(&temp_dir)
            .args(["log", "cardio", minutes])
            .assert()
            .success();
    }

    cli(&temp_dir)
        .arg("history-csv")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 logs"));

    let content = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn test_catalog_lists_ladders() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("One-arm pushup"))
        .stdout(predicate::str::contains("Full front lever"));
}
