//! Integration tests for the herdbook binary.
//!
//! These tests verify end-to-end behavior including:
//! - Registering, renaming, converting and removing calves
//! - Herd-wide ringworm batching as seen through the job list
//! - Persistence of the whole herd between invocations
//! - Error reporting for unknown or duplicate ear tags

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI command isolated from the user's own config file
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("herdbook").expect("Failed to find herdbook binary");
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn add_calf(dir: &Path, ear_tag: u32, birth: &str, category: &str) {
    cli(dir)
        .args(["add", "--ear-tag", &ear_tag.to_string(), "--birth", birth])
        .args(["--sex", "w", "--category", category])
        .assert()
        .success();
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is not JSON")
}

fn jobs(dir: &Path, week: u32) -> Vec<Value> {
    let value = json_output(cli(dir).args(["jobs", "--week", &week.to_string(), "--json"]));
    value.as_array().expect("jobs is an array").clone()
}

fn rows(dir: &Path) -> Vec<Value> {
    let value = json_output(cli(dir).args(["list", "--json"]));
    value.as_array().expect("list is an array").clone()
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Calf treatment scheduling and weekly job lists",
        ));
}

#[test]
fn test_add_creates_herd_file() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 12345, "2023-11-20", "breeding");

    let herd_path = temp_dir.path().join("data/herd.csv");
    let contents = std::fs::read_to_string(&herd_path).expect("Failed to read herd file");
    assert!(contents.starts_with("ear_tag,sex,category,treatment,planned,actual"));
    assert!(contents.contains("12345,w,breeding,second_vaccination,2023-12-21,"));
}

#[test]
fn test_add_prints_schedule() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["add", "--ear-tag", "7", "--birth", "2023-11-20"])
        .args(["--sex", "m", "--category", "fattening"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added fattening calf 7"))
        .stdout(predicate::str::contains("2023-12-19"));
}

#[test]
fn test_add_suggests_ear_tag() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 41, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["add", "--birth", "2023-11-21", "--sex", "m", "--category", "fattening"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added fattening calf 42"));
}

#[test]
fn test_no_ear_tag_left_to_suggest() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), u32::MAX, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["add", "--birth", "2023-11-21", "--sex", "m", "--category", "fattening"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No free ear tag"));

    assert_eq!(rows(temp_dir.path()).len(), 1);
}

#[test]
fn test_duplicate_ear_tag_rejected() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 12341, "2023-11-15", "breeding");

    cli(temp_dir.path())
        .args(["add", "--ear-tag", "12341", "--birth", "2023-11-18"])
        .args(["--sex", "m", "--category", "fattening"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(rows(temp_dir.path()).len(), 1);
}

#[test]
fn test_fifth_breeding_calf_schedules_deworming() {
    let temp_dir = setup_test_dir();
    for tag in 12341..12345 {
        add_calf(temp_dir.path(), tag, "2023-11-20", "breeding");
    }
    // Week 52 of 2023 holds the first deworming date
    assert!(jobs(temp_dir.path(), 52).is_empty());

    add_calf(temp_dir.path(), 12345, "2023-11-20", "breeding");

    let week_52 = jobs(temp_dir.path(), 52);
    assert_eq!(week_52.len(), 5);
    for job in &week_52 {
        assert_eq!(job["kind"], "deworming1");
        assert_eq!(job["date"], "2023-12-26");
    }

    let week_2 = jobs(temp_dir.path(), 2);
    assert_eq!(week_2.len(), 5);
    assert!(week_2.iter().all(|job| job["date"] == "2024-01-09"));
}

#[test]
fn test_remove_dissolves_batch() {
    let temp_dir = setup_test_dir();
    for tag in 1..=5 {
        add_calf(temp_dir.path(), tag, "2023-11-20", "breeding");
    }
    assert_eq!(jobs(temp_dir.path(), 52).len(), 5);

    cli(temp_dir.path())
        .args(["remove", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 calves"));

    assert!(jobs(temp_dir.path(), 52).is_empty());
    assert_eq!(rows(temp_dir.path()).len(), 4);
}

#[test]
fn test_recorded_deworming_persists() {
    let temp_dir = setup_test_dir();
    for tag in 1..=5 {
        add_calf(temp_dir.path(), tag, "2023-11-20", "breeding");
    }

    cli(temp_dir.path())
        .args(["edit", "2", "deworming1", "2023-12-27"])
        .assert()
        .success();

    let rows = rows(temp_dir.path());
    let calf = rows.iter().find(|row| row["ear_tag"] == 2).unwrap();
    assert_eq!(calf["deworming1"], "2023-12-27");
    assert_eq!(calf["deworming2"], "2024-01-10");

    let week_52 = jobs(temp_dir.path(), 52);
    assert!(week_52
        .iter()
        .any(|job| job["ear_tag"] == 2 && job["date"] == "2023-12-27"));
}

#[test]
fn test_deworming_edit_on_lone_calf_persists() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 1, "2023-11-20", "breeding");
    assert_eq!(rows(temp_dir.path())[0]["deworming1"], Value::Null);

    cli(temp_dir.path())
        .args(["edit", "1", "deworming1", "2023-12-27"])
        .assert()
        .success();

    assert_eq!(rows(temp_dir.path())[0]["deworming1"], "2023-12-27");
}

#[test]
fn test_remove_unknown_calf_fails() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 1, "2023-11-20", "breeding");

    cli(temp_dir.path())
        .args(["remove", "1", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound(99)"));

    // Nothing was removed
    assert_eq!(rows(temp_dir.path()).len(), 1);
}

#[test]
fn test_edit_birth_moves_schedule() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["edit", "3", "birth", "2023-11-27"])
        .assert()
        .success();

    let rows = rows(temp_dir.path());
    assert_eq!(rows[0]["birth"], "2023-11-27");
    assert_eq!(rows[0]["first_vaccination"], "2023-12-07");
    assert_eq!(rows[0]["sale"], "2023-12-26");
}

#[test]
fn test_edit_dehorning_off() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["edit", "3", "dehorning", "2023-12-05", "--no-dehorning"])
        .assert()
        .success();

    let rows = rows(temp_dir.path());
    assert_eq!(rows[0]["dehorning_required"], false);
    assert_eq!(rows[0]["dehorning"], Value::Null);
    assert_eq!(rows[0]["restocking"], "2023-12-05");
}

#[test]
fn test_edit_unknown_treatment_rejected() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["edit", "3", "bovalto", "2023-12-05"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown treatment"));
}

#[test]
fn test_rename_and_convert() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path()).args(["rename", "3", "30"]).assert().success();
    cli(temp_dir.path())
        .args(["convert", "30", "breeding"])
        .assert()
        .success();

    let rows = rows(temp_dir.path());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["ear_tag"], 30);
    assert_eq!(rows[0]["category"], "breeding");
    assert_eq!(rows[0]["sale"], Value::Null);
    assert_eq!(rows[0]["second_vaccination"], "2023-12-21");
}

#[test]
fn test_set_sex() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path()).args(["set-sex", "3", "m"]).assert().success();
    assert_eq!(rows(temp_dir.path())[0]["sex"], "m");
}

#[test]
fn test_empty_week_has_no_jobs() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["jobs", "--week", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do this week"));
}

#[test]
fn test_weights_roundtrip() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["weigh", "3", "48", "--date", "2023-12-01"])
        .assert()
        .success();
    cli(temp_dir.path())
        .args(["weigh", "3", "55", "--date", "2023-12-15"])
        .assert()
        .success();

    cli(temp_dir.path())
        .args(["weights", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2023-12-01    48 kg"))
        .stdout(predicate::str::contains("2023-12-15    55 kg"));
}

#[test]
fn test_zero_weight_rejected() {
    let temp_dir = setup_test_dir();
    add_calf(temp_dir.path(), 3, "2023-11-20", "fattening");

    cli(temp_dir.path())
        .args(["weigh", "3", "0", "--date", "2023-12-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be zero"));

    assert!(!temp_dir.path().join("data/weights.csv").exists());
}

#[test]
fn test_weigh_unknown_calf_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["weigh", "3", "48"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound(3)"));
}
