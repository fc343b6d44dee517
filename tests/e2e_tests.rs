//! End-to-end CLI tests for tablets.
//!
//! These tests exercise the full CLI binary with isolated test environments.
//! Each test creates its own temporary database and config to ensure isolation.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_ATF: &str = "\
&P100001 = lugal letter
@obverse
1. a-na lugal
2. qi2-bi2-ma
@reverse
1. udu <ab> & sila4
&P100002 = sheep receipt
#atf: lang akk
@obverse
1. 3(disz) udu
2. ki lu2-{d}utu
@envelope
@seal 1
1. lu2-{d}utu dub-sar
";

// =============================================================================
// Test Environment Helper
// =============================================================================

/// Isolated test environment with its own database and config.
struct TestEnv {
    temp_dir: TempDir,
    database_path: PathBuf,
    config_path: PathBuf,
}

impl TestEnv {
    /// Create a new environment with no database yet.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        let database_path = root.join("data").join("corpus.db");
        let config_path = root.join("config.toml");
        let config_content = format!("[database]\npath = \"{}\"\n", database_path.display());
        fs::write(&config_path, config_content).expect("Failed to write config");

        Self {
            temp_dir,
            database_path,
            config_path,
        }
    }

    /// Create an environment with the sample tablets imported.
    fn with_tablets() -> Self {
        let env = Self::new();
        let atf = env.write_file("sample.atf", SAMPLE_ATF);
        env.command().arg("import").arg(&atf).assert().success();
        env
    }

    /// Write a file into the environment and return its path.
    fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Get a Command configured for this test environment.
    fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("tablets");
        cmd.env("TABLETS_CONFIG", &self.config_path);
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

// =============================================================================
// 1. Help / No Command Tests
// =============================================================================

#[test]
fn tc_1_1_no_subcommand_shows_help() {
    let env = TestEnv::new();

    env.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn tc_1_2_search_help_lists_flags() {
    let env = TestEnv::new();

    env.command()
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--regex"))
        .stdout(predicate::str::contains("--page"))
        .stdout(predicate::str::contains("--format"));
}

// =============================================================================
// 2. Init / Import Tests
// =============================================================================

#[test]
fn tc_2_1_init_creates_database() {
    let env = TestEnv::new();

    env.command()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialised database"));

    assert!(env.database_path.exists());
}

#[test]
fn tc_2_2_import_reports_tablet_count() {
    let env = TestEnv::new();
    let atf = env.write_file("sample.atf", SAMPLE_ATF);

    env.command()
        .arg("import")
        .arg(&atf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 tablets from"))
        .stdout(predicate::str::contains("Corpus now holds 2 tablets"));
}

#[test]
fn tc_2_3_import_missing_file_fails() {
    let env = TestEnv::new();

    env.command()
        .args(["import", "/nonexistent/tablets.atf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn tc_2_4_import_malformed_atf_fails() {
    let env = TestEnv::new();
    let atf = env.write_file("bad.atf", "1. udu\n");

    env.command()
        .arg("import")
        .arg(&atf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

#[test]
fn tc_2_5_import_requires_files() {
    let env = TestEnv::new();

    env.command().arg("import").assert().failure();
}

// =============================================================================
// 3. Search Tests
// =============================================================================

#[test]
fn tc_3_1_search_finds_tablets() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "udu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Returned 2 results"))
        .stdout(predicate::str::contains("lugal letter"))
        .stdout(predicate::str::contains("sheep receipt"));
}

#[test]
fn tc_3_2_search_requires_every_term() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "udu lugal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found"));
}

#[test]
fn tc_3_3_blank_query_prints_no_matches() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found"));
}

#[test]
fn tc_3_4_search_json_format() {
    let env = TestEnv::with_tablets();

    let output = env
        .command()
        .args(["search", "sila4", "--format", "json"])
        .output()
        .expect("Failed to run search");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is valid json");
    assert_eq!(json["pagination"]["total_results"], 1);
    assert_eq!(json["documents"][0]["name"], "P100001 = lugal letter");
    assert_eq!(
        json["documents"][0]["objects"][0]["sections"][1]["lines"][0],
        "udu &lt;ab&gt; &amp; <mark>sila4</mark>"
    );
}

#[test]
fn tc_3_5_search_html_format() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "udu", "-f", "html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<mark>udu</mark>"))
        .stdout(predicate::str::contains("ObjectID=P100002"))
        .stdout(predicate::str::contains("class=\"pagination\""));
}

#[test]
fn tc_3_6_regex_search() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "--regex", "lu2-\\{d\\}utu dub"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Returned 1 results"))
        .stdout(predicate::str::contains("sheep receipt"));
}

#[test]
fn tc_3_7_invalid_regex_fails() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "--regex", "udu("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid search pattern"));
}

#[test]
fn tc_3_8_page_zero_rejected() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "udu", "--page", "0"])
        .assert()
        .failure();
}

#[test]
fn tc_3_9_page_past_end_keeps_total() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["search", "udu", "--page", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Returned 2 results"))
        .stdout(predicate::str::contains("lugal letter").not());
}

#[test]
fn tc_3_10_query_too_long() {
    let env = TestEnv::with_tablets();
    let query = "a".repeat(1001);

    env.command()
        .args(["search", &query])
        .assert()
        .failure()
        .stderr(predicate::str::contains("too long"));
}

#[test]
fn tc_3_11_search_without_database_fails() {
    let env = TestEnv::new();

    env.command()
        .args(["search", "udu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tablets init"));
}

#[test]
fn tc_3_12_database_flag_overrides_config() {
    let env = TestEnv::with_tablets();
    let other = env.temp_dir.path().join("other.db");

    env.command()
        .arg("--database")
        .arg(&other)
        .arg("init")
        .assert()
        .success();

    env.command()
        .arg("--database")
        .arg(&other)
        .args(["search", "udu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found"));
}

// =============================================================================
// 4. Show Tests
// =============================================================================

#[test]
fn tc_4_1_show_numbers_lines() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2] P100002 = sheep receipt (akk)"))
        .stdout(predicate::str::contains("  1. 3(disz) udu"))
        .stdout(predicate::str::contains("  2. ki lu2-{d}utu"))
        .stdout(predicate::str::contains("seal 1"));
}

#[test]
fn tc_4_2_show_unknown_tablet_fails() {
    let env = TestEnv::with_tablets();

    env.command()
        .args(["show", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no detail rows"));
}

#[test]
fn tc_4_3_show_json() {
    let env = TestEnv::with_tablets();

    let output = env
        .command()
        .args(["show", "1", "--format", "json"])
        .output()
        .expect("Failed to run show");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is valid json");
    assert_eq!(json["id"], 1);
    assert_eq!(json["lang"], "sux");
    assert_eq!(json["objects"][0]["name"], "tablet");
    assert_eq!(json["objects"][0]["sections"][1]["lines"][0], "udu <ab> & sila4");
}
