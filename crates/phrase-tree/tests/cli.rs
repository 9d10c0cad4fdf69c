//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

const PHRASES: &str = "\
phrase,length,freq,score,source
fox,1,40,0.1,a
brown fox,2,20,0.2,a
quick brown fox,3,10,0.3,b
the quick brown fox,4,5,0.4,b
the quick brown fox jumps,5,2,0.5,c
red car,2,8,0.6,d
";

/// Write the sample table into a fresh directory.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("phrases.csv"), PHRASES).unwrap();
    tmp
}

fn in_dir(dir: &Path) -> Command {
    let mut c = cmd();
    c.args(["-C", dir.to_str().unwrap()]);
    c
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn long_help_lists_environment() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PHRASE_TREE_LOG_DIR"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let output = cmd().arg("info").arg("--json").assert().success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["--quiet", "info"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

// =============================================================================
// Build Command
// =============================================================================

#[test]
fn build_writes_table_and_view() {
    let tmp = workspace();
    in_dir(tmp.path())
        .args(["--color", "never", "build", "phrases.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 phrases"))
        .stdout(predicate::str::contains("3 linked"));

    let table = fs::read_to_string(tmp.path().join("results_tree.csv")).unwrap();
    let mut lines = table.lines();
    assert_eq!(
        lines.next(),
        Some("phrase,length,freq,score,source,id,parent_id,level")
    );
    assert_eq!(lines.next(), Some("fox,1,40,0.1,a,0,,0"));
    assert!(table.contains("the quick brown fox jumps,5,2,0.5,c,5,4,3"));

    let html = fs::read_to_string(tmp.path().join("visualization.html")).unwrap();
    assert!(html.contains("the quick brown fox jumps"));
}

#[test]
fn build_respects_output_flags() {
    let tmp = workspace();
    in_dir(tmp.path())
        .args([
            "build",
            "phrases.csv",
            "--output",
            "linked.csv",
            "--no-html",
            "--tree-json",
            "tree.json",
        ])
        .assert()
        .success();

    assert!(tmp.path().join("linked.csv").exists());
    assert!(!tmp.path().join("visualization.html").exists());
    let tree: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("tree.json")).unwrap()).unwrap();
    assert!(tree.is_array());
}

#[test]
fn build_json_reports_summary() {
    let tmp = workspace();
    let output = in_dir(tmp.path())
        .args(["--json", "build", "phrases.csv", "--no-html"])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["input_rows"], 6);
    assert_eq!(json["link"]["phrases"], 6);
    assert_eq!(json["link"]["roots"], 3);
    assert_eq!(json["link"]["max_level"], 3);
    assert!(json.get("html").is_none());
}

#[test]
fn build_nothing_to_process_succeeds_without_output() {
    let tmp = workspace();
    in_dir(tmp.path())
        .args(["build", "phrases.csv", "--min-freq", "1000"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No phrases match the specified criteria"));
    assert!(!tmp.path().join("results_tree.csv").exists());
}

#[test]
fn build_missing_freq_column_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.csv"), "phrase,length\nfox,1\n").unwrap();
    in_dir(tmp.path())
        .args(["build", "bad.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("freq"));
}

#[test]
fn build_missing_input_fails() {
    let tmp = TempDir::new().unwrap();
    in_dir(tmp.path())
        .args(["build", "absent.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.csv"));
}

#[test]
fn build_rejects_zero_min_parent_words() {
    let tmp = workspace();
    in_dir(tmp.path())
        .args(["build", "phrases.csv", "--min-parent-words", "0"])
        .assert()
        .failure();
}

// =============================================================================
// Tree Command
// =============================================================================

#[test]
fn tree_prints_compressed_forest() {
    let tmp = workspace();
    in_dir(tmp.path())
        .args(["--color", "never", "tree", "phrases.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("the quick brown fox jumps F:2 L:5"))
        .stdout(predicate::str::contains("red car F:8 L:2"));
}

#[test]
fn tree_json_matches_schema_shape() {
    let tmp = workspace();
    let output = in_dir(tmp.path())
        .args(["--json", "tree", "phrases.csv"])
        .assert()
        .success();

    let forest: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    let roots = forest.as_array().unwrap();
    // "brown fox" through "jumps" is a single chain and collapses to its leaf.
    let phrases: Vec<_> = roots.iter().map(|n| n["phrase"].as_str().unwrap()).collect();
    assert_eq!(phrases, vec!["fox", "red car", "the quick brown fox jumps"]);
    assert_eq!(roots[2]["display_phrase"], "the quick brown fox jumps");
    assert!(roots.iter().all(|n| n["children"].as_array().unwrap().is_empty()));
}

#[test]
fn tree_merges_duplicates_on_request() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("dups.csv"),
        "phrase,freq\nbig dog,3\nBig  Dog,4\nthe big dog,1\nred car,9\n",
    )
    .unwrap();
    let output = in_dir(tmp.path())
        .args(["--json", "tree", "dups.csv", "--duplicate-policy", "merge"])
        .assert()
        .success();
    let forest: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    let phrases: Vec<_> = forest
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["phrase"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(phrases, vec!["red car", "the big dog"]);
}

// =============================================================================
// Schema Command
// =============================================================================

#[test]
fn schema_describes_compressed_node() {
    let output = cmd().arg("schema").assert().success();
    let schema: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert!(schema["properties"]["display_phrase"].is_object());
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn html_and_no_html_conflict() {
    let tmp = workspace();
    in_dir(tmp.path())
        .args(["build", "phrases.csv", "--html", "x.html", "--no-html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// =============================================================================
// Chdir Flag
// =============================================================================

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}
