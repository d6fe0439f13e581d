//! CLI tests for rdspump
//!
//! None of these reach a database: they cover argument parsing, configuration lookup, profile
//! listing and the checks that run before a connection is attempted.

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;

const CONFIG: &str = "\
[DEFAULT]
user = scott
password = tiger
directory = DATA_PUMP_DIR

[prod]
address = prod.example.com
service = PROD

[test]
address = test.example.com
sid = TST
";

/// Empty working directory that doubles as $HOME, so no real config file is picked up
fn sandbox() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

fn with_config(contents: &str) -> tempfile::TempDir {
    let dir = sandbox();
    std::fs::write(dir.path().join("rdspump.cfg"), contents).unwrap();
    dir
}

fn rdspump(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rdspump").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_runs() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn test_version_runs() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}

#[test]
fn test_subcommand_help_runs() {
    for sub in ["get", "put", "del"] {
        Command::cargo_bin("rdspump")
            .unwrap()
            .args([sub, "--help"])
            .assert()
            .success();
    }
}

// ============================================================================
// Mode selection
// ============================================================================

#[test]
fn test_no_subcommand_prints_usage() {
    // no config file exists, so reaching configuration or connection would fail differently
    let dir = sandbox();
    rdspump(&dir)
        .assert()
        .code(2)
        .stderr(predicates::str::contains("At least one subcommand expected."))
        .stderr(predicates::str::contains("Usage:"));
}

#[test]
fn test_no_subcommand_with_profile_prints_usage() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["-P", "prod"])
        .assert()
        .code(2)
        .stderr(predicates::str::contains("Usage:"));
}

#[test]
fn test_too_many_positionals() {
    let dir = sandbox();
    rdspump(&dir)
        .args(["get", "DIR", "file", "extra"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_file_name() {
    let dir = sandbox();
    rdspump(&dir).args(["del"]).assert().code(2);
}

// ============================================================================
// Profile listing
// ============================================================================

#[test]
fn test_list_all_profiles() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .arg("-l")
        .assert()
        .success()
        .stdout("prod\ntest\n");
}

#[test]
fn test_list_all_profiles_wildcard() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["--list-profiles", "*"])
        .assert()
        .success()
        .stdout("prod\ntest\n");
}

#[test]
fn test_list_single_profile() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["-l", "test"])
        .assert()
        .success()
        .stdout("address: test.example.com\nsid: TST\n");
}

#[test]
fn test_list_unknown_profile() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["-l", "staging"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("Not Found: staging"))
        .stdout(predicates::str::contains("address:").not());
}

#[test]
fn test_list_from_home_config() {
    let dir = sandbox();
    std::fs::write(dir.path().join(".rdspump.cfg"), CONFIG).unwrap();
    rdspump(&dir)
        .arg("-l")
        .assert()
        .success()
        .stdout("prod\ntest\n");
}

#[test]
fn test_list_explicit_config() {
    let dir = sandbox();
    let path = dir.path().join("other.cfg");
    std::fs::write(&path, "[DEFAULT]\nuser = a\n[only]\nsid = X\n").unwrap();
    rdspump(&dir)
        .args(["-c", path.to_str().unwrap(), "-l"])
        .assert()
        .success()
        .stdout("only\n");
}

// ============================================================================
// Configuration errors (reported before connecting)
// ============================================================================

#[test]
fn test_missing_config_file() {
    let dir = sandbox();
    rdspump(&dir)
        .args(["del", "DATA_PUMP_DIR", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("config file not found"));
}

#[test]
fn test_missing_config_file_for_listing() {
    let dir = sandbox();
    rdspump(&dir)
        .arg("-l")
        .assert()
        .code(1)
        .stdout(predicates::str::contains("config file not found"));
}

#[test]
fn test_unknown_profile() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["-P", "staging", "del", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("no such profile \"staging\""));
}

#[test]
fn test_insufficient_connection_fields() {
    // DEFAULT has no address, so no descriptor can be built
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["del", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("address is not set"));
}

#[test]
fn test_missing_service_and_sid() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["--address", "db.example.com", "del", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("either service or sid must be set"));
}

#[test]
fn test_missing_directory() {
    let dir = with_config("[DEFAULT]\nuser = a\npassword = b\n");
    rdspump(&dir)
        .args(["del", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("remote directory"));
}

#[test]
fn test_invalid_port_in_config() {
    let dir = with_config("[DEFAULT]\nport = eleven\n");
    rdspump(&dir)
        .args(["del", "DIR", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("invalid port"));
}

#[test]
fn test_chunk_size_too_large() {
    let dir = with_config(CONFIG);
    rdspump(&dir)
        .args(["-P", "prod", "--chunk-size", "64KiB", "get", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::contains("chunk size must be between"));
}

#[test]
fn test_quiet_suppresses_errors() {
    let dir = sandbox();
    rdspump(&dir)
        .args(["-q", "del", "DIR", "a.dmp"])
        .assert()
        .code(1)
        .stdout(predicates::str::is_empty());
}

// ============================================================================
// Argument parsing
// ============================================================================

#[test]
fn test_progress_type_auto_lowercase() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .args(["--progress-type", "auto", "--help"])
        .assert()
        .success();
}

#[test]
fn test_progress_type_text_updates_pascal_case() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .args(["--progress-type", "TextUpdates", "--help"])
        .assert()
        .success();
}

#[test]
fn test_progress_type_progress_bar_kebab_case() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .args(["--progress-type", "progress-bar", "--help"])
        .assert()
        .success();
}

#[test]
fn test_progress_type_invalid_value() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .args(["--progress-type", "invalid-value", "--help"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid value 'invalid-value'"));
}

#[test]
fn test_invalid_port_argument() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .args(["--port", "99999", "--help"])
        .assert()
        .failure();
}

#[test]
fn test_get_gzip_flag() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .args(["get", "-z", "a.dmp", "--help"])
        .assert()
        .success();
}

#[test]
fn test_verbose_triple() {
    Command::cargo_bin("rdspump")
        .unwrap()
        .args(["-vvv", "--help"])
        .assert()
        .success();
}
