//! CLI integration tests for move2innodb.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for errors raised before any database connection.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the move2innodb binary.
fn cmd() -> Command {
    Command::cargo_bin("move2innodb").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("settings"))
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_migrate_subcommand_help() {
    cmd()
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--engine"));
}

#[test]
fn test_settings_subcommand_help() {
    cmd()
        .args(["settings", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--use-innodb"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("move2innodb"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flags_exist() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_short_config_flag() {
    cmd()
        .args(["-c", "some_config.yaml", "--help"])
        .assert()
        .success();
}

// =============================================================================
// Argument Errors
// =============================================================================

#[test]
fn test_migrate_requires_engine() {
    cmd()
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--engine"));
}

#[test]
fn test_settings_rejects_non_bool() {
    cmd()
        .args(["settings", "--use-innodb", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "status"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "status"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_required_fields_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "database:").unwrap();
    writeln!(file, "  host: localhost").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_bad_table_prefix_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "database:").unwrap();
    writeln!(file, "  host: localhost").unwrap();
    writeln!(file, "  database: vanilla").unwrap();
    writeln!(file, "  user: forum").unwrap();
    writeln!(file, "  table_prefix: \"GDN_; DROP TABLE x\"").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "migrate", "--engine", "InnoDB"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("table_prefix"));
}
