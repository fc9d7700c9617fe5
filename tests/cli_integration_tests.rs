//! CLI Integration Tests
//!
//! Runs the statforge binary with assert_cmd to exercise main.rs code paths.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn statforge() -> Command {
    let mut cmd = Command::cargo_bin("statforge").unwrap();
    cmd.env_remove("STATFORGE_PREVIEW_LEVEL").env("NO_COLOR", "1");
    cmd
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    statforge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("statforge"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    statforge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("statforge"));
}

#[test]
fn test_validate_help() {
    statforge()
        .args(["validate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STATFORGE_PREVIEW_LEVEL"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CHECK AND EVAL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_check_valid_with_sample() {
    statforge()
        .args(["check", "VIT * 12 + Level * 5", "-s", "VIT=8", "-s", "Level=10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("146"));
}

#[test]
fn test_check_known_list() {
    statforge()
        .args(["check", "STR + INT * 2", "--known", "STR,INT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid"));
}

#[test]
fn test_check_unknown_variable_fails() {
    statforge()
        .args(["check", "STR + UNKNOWNVAR", "-k", "STR"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unknown variable(s): UNKNOWNVAR"));
}

#[test]
fn test_check_bad_binding() {
    statforge()
        .args(["check", "X", "-s", "X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=VALUE"));
}

#[test]
fn test_eval_prints_value() {
    statforge()
        .args(["eval", "Max(1, 5 - SkillRank * 0.5)", "--set", "SkillRank=3"])
        .assert()
        .success()
        .stdout(predicate::str::diff("3.5\n"));
}

#[test]
fn test_eval_right_associative_power() {
    statforge()
        .args(["eval", "2^3^2"])
        .assert()
        .success()
        .stdout(predicate::str::diff("512\n"));
}

#[test]
fn test_eval_division_by_zero_fails() {
    statforge()
        .args(["eval", "1 / X", "-s", "X=0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Division by zero"));
}

#[test]
fn test_functions_lists_builtins() {
    statforge()
        .arg("functions")
        .assert()
        .success()
        .stdout(predicate::str::contains("sqrt"))
        .stdout(predicate::str::contains("pow"));
}

// ═══════════════════════════════════════════════════════════════════════════
// RULES FILES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_validate_sample_files() {
    statforge()
        .args(["validate", "test-data/warrior.yaml", "test-data/mage.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 files are valid"));
}

#[test]
fn test_validate_prints_level_up_rules() {
    statforge()
        .args(["validate", "test-data/warrior.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Level up: 5 stat points, 1 skill points",
        ))
        .stdout(predicate::str::contains(
            "Bonus: Extra skill point every 10 levels",
        ));
}

#[test]
fn test_validate_broken_file_fails() {
    statforge()
        .args(["validate", "test-data/broken.yaml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Found 5 formula errors"))
        .stdout(predicate::str::contains("stat 'PhysDmg': Unknown variable(s): WEAPON"));
}

#[test]
fn test_validate_level_from_env() {
    statforge()
        .env("STATFORGE_PREVIEW_LEVEL", "1")
        .args(["validate", "test-data/mage.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("preview level 1"));
}

#[test]
fn test_validate_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.toml");
    fs::write(&path, "stats = []").unwrap();

    statforge()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported rules file extension"));
}

#[test]
fn test_curve_linear_table() {
    statforge()
        .args([
            "curve",
            "--kind",
            "linear",
            "--base-xp",
            "100",
            "--multiplier",
            "50",
            "--max-level",
            "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"3\s+200\s+450").unwrap());
}

#[test]
fn test_curve_custom_formula_warns_on_unknown_variable() {
    statforge()
        .args(["curve", "--formula", "Level * Gold", "-m", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown variable(s): Gold"))
        .stdout(predicate::str::is_match(r"2\s+200\s+300").unwrap());
}

#[test]
fn test_curve_rejects_unknown_kind() {
    statforge()
        .args(["curve", "--kind", "cubic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown curve kind"));
}

#[test]
fn test_audit_stat() {
    statforge()
        .args(["audit", "test-data/warrior.yaml", "VIT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HP"))
        .stdout(predicate::str::contains("Guard"))
        .stdout(predicate::str::contains("indirect"));
}

#[test]
fn test_audit_cycle() {
    statforge()
        .args(["audit", "test-data/cycle.yaml", "Attack"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Circular dependency detected"));
}

#[test]
fn test_audit_unknown_stat() {
    statforge()
        .args(["audit", "test-data/warrior.yaml", "Luck"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stat 'Luck' not found"));
}
