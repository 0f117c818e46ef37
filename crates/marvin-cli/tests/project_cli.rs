//! Integration tests for project setup and document commands.
//!
//! Each test creates a fresh temporary project and runs the real `marvin`
//! binary via `assert_cmd`, checking exit codes, output and files on disk.

mod common;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{init_project, marvin_cmd};

// ============================================================================
// init / status
// ============================================================================

#[test]
fn test_init_creates_project_layout() {
    let temp = TempDir::new().expect("create temp dir");
    let root = temp.path();

    marvin_cmd()
        .current_dir(root)
        .args(["init", "--name", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized Marvin project `demo`"));

    assert!(root.join(".marvin/config.yaml").is_file());
    assert!(root.join(".marvin/docs/decisions").is_dir());
    assert!(root.join(".marvin/docs/meetings").is_dir());
    assert!(root.join(".marvin/sources").is_dir());
}

#[test]
fn test_init_twice_fails() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_commands_outside_project_fail_with_hint() {
    let temp = TempDir::new().expect("create temp dir");

    marvin_cmd()
        .current_dir(temp.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Marvin project found"))
        .stderr(predicate::str::contains("marvin init"));
}

#[test]
fn test_status_reports_counts() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(temp.path())
        .args(["new", "decision", "--title", "Use REST"])
        .assert()
        .success();

    marvin_cmd()
        .current_dir(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project: test"))
        .stdout(predicate::str::contains("Documents: 1"))
        .stdout(predicate::str::contains("decision"));

    let output = marvin_cmd()
        .current_dir(temp.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["documents"]["decision"], 1);
    assert_eq!(json["sources"]["pending"], 0);
}

#[test]
fn test_project_flag_from_elsewhere() {
    let temp = TempDir::new().expect("create temp dir");
    let elsewhere = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(elsewhere.path())
        .arg("--project")
        .arg(temp.path())
        .args(["new", "question", "--title", "Which cloud?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created Q-001"));

    assert!(temp.path().join(".marvin/docs/questions/Q-001.md").is_file());
}

// ============================================================================
// new / list / show / update
// ============================================================================

#[test]
fn test_new_allocates_sequential_ids() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    for expected in ["D-001", "D-002"] {
        marvin_cmd()
            .current_dir(temp.path())
            .args(["new", "decision", "--title", "Something"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Created {}", expected)));
    }

    marvin_cmd()
        .current_dir(temp.path())
        .args(["new", "action", "--title", "Follow up", "--owner", "alice", "--tag", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created A-001"));
}

#[test]
fn test_new_unknown_type_fails() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(temp.path())
        .args(["new", "widget", "--title", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown document type: widget"));
}

#[test]
fn test_list_filters_and_json() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(temp.path())
        .args(["new", "decision", "--title", "Use REST", "--tag", "api"])
        .assert()
        .success();
    marvin_cmd()
        .current_dir(temp.path())
        .args(["new", "action", "--title", "Write ADR", "--owner", "alice"])
        .assert()
        .success();

    marvin_cmd()
        .current_dir(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("D-001"))
        .stdout(predicate::str::contains("A-001"));

    let output = marvin_cmd()
        .current_dir(temp.path())
        .args(["list", "--owner", "alice", "--json"])
        .output()
        .expect("run list");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let docs = json.as_array().expect("array");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["frontmatter"]["id"], "A-001");

    marvin_cmd()
        .current_dir(temp.path())
        .args(["list", "--tag", "missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No documents found"));

    marvin_cmd()
        .current_dir(temp.path())
        .args(["list", "--type", "widget"])
        .assert()
        .failure();
}

#[test]
fn test_show_and_update() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(temp.path())
        .args([
            "new",
            "decision",
            "--title",
            "Use REST",
            "--content",
            "Because it is simple.",
        ])
        .assert()
        .success();

    marvin_cmd()
        .current_dir(temp.path())
        .args(["show", "D-001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Use REST"))
        .stdout(predicate::str::contains("Status: open"))
        .stdout(predicate::str::contains("Because it is simple."));

    marvin_cmd()
        .current_dir(temp.path())
        .args(["update", "D-001", "--status", "accepted", "--owner", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated D-001"));

    marvin_cmd()
        .current_dir(temp.path())
        .args(["show", "D-001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: accepted"))
        .stdout(predicate::str::contains("Owner: bob"))
        .stdout(predicate::str::contains("Because it is simple."));
}

#[test]
fn test_update_errors() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(temp.path())
        .args(["update", "D-042", "--status", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document D-042 not found"));

    marvin_cmd()
        .current_dir(temp.path())
        .args(["update", "D-001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));
}

#[test]
fn test_show_missing_document() {
    let temp = TempDir::new().expect("create temp dir");
    init_project(temp.path());

    marvin_cmd()
        .current_dir(temp.path())
        .args(["show", "Q-009"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document Q-009 not found"));
}
