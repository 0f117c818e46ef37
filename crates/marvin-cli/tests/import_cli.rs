//! Integration tests for `marvin import` and `marvin sources`.

mod common;

use std::fs;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{init_project, marvin_cmd, write_doc};

#[test]
fn test_import_renumber_and_skip() {
    let project = TempDir::new().expect("create temp dir");
    let input = TempDir::new().expect("create temp dir");
    init_project(project.path());
    let file = input.path().join("D-001.md");
    write_doc(&file, "D-001", "decision", "Use REST", "We will use REST.");

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected: marvin-document"))
        .stdout(predicate::str::contains("Imported 1 document(s)"));

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("was D-001 \u{2192} D-002"));
    assert!(project.path().join(".marvin/docs/decisions/D-002.md").is_file());

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(&file)
        .args(["--conflict", "skip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped (1)"))
        .stdout(predicate::str::contains("skipped 1"));
    assert!(!project.path().join(".marvin/docs/decisions/D-003.md").exists());
}

#[test]
fn test_import_dry_run_changes_nothing() {
    let project = TempDir::new().expect("create temp dir");
    let input = TempDir::new().expect("create temp dir");
    init_project(project.path());
    write_doc(&input.path().join("Q-001.md"), "Q-001", "question", "Why?", "");
    fs::write(input.path().join("notes.txt"), "notes").unwrap();

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(input.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected: docs-directory"))
        .stdout(predicate::str::contains("Dry run"));

    assert!(!project.path().join(".marvin/docs/questions/Q-001.md").exists());
}

#[test]
fn test_import_dry_run_json() {
    let project = TempDir::new().expect("create temp dir");
    let input = TempDir::new().expect("create temp dir");
    init_project(project.path());
    fs::write(input.path().join("paper.pdf"), b"%PDF").unwrap();

    let output = marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(input.path())
        .args(["--dry-run", "--json"])
        .output()
        .expect("run import");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["classification"], "raw-source-dir");
    assert_eq!(json["items"][0]["action"], "copy");
    assert_eq!(json["items"][0]["targetName"], "paper.pdf");
}

#[test]
fn test_import_empty_directory() {
    let project = TempDir::new().expect("create temp dir");
    let input = TempDir::new().expect("create temp dir");
    init_project(project.path());

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to import"));
}

#[test]
fn test_import_rejects_bad_input() {
    let project = TempDir::new().expect("create temp dir");
    init_project(project.path());

    marvin_cmd()
        .current_dir(project.path())
        .args(["import", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));

    marvin_cmd()
        .current_dir(project.path())
        .args(["import", ".", "--conflict", "merge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid conflict strategy"));
}

#[test]
fn test_import_with_tag_then_list() {
    let project = TempDir::new().expect("create temp dir");
    let input = TempDir::new().expect("create temp dir");
    init_project(project.path());
    write_doc(&input.path().join("decisions/D-004.md"), "D-004", "decision", "Adopt Rust", "");

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(input.path())
        .args(["--tag", "legacy"])
        .assert()
        .success();

    marvin_cmd()
        .current_dir(project.path())
        .args(["list", "--tag", "legacy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("D-004"))
        .stdout(predicate::str::contains("Adopt Rust"));
}

#[test]
fn test_raw_files_flow_into_sources() {
    let project = TempDir::new().expect("create temp dir");
    let input = TempDir::new().expect("create temp dir");
    init_project(project.path());
    fs::write(input.path().join("paper.pdf"), b"%PDF-1.7").unwrap();

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("copied 1 file(s)"));
    assert!(project.path().join(".marvin/sources/paper.pdf").is_file());

    marvin_cmd()
        .current_dir(project.path())
        .args(["sources", "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 added"))
        .stdout(predicate::str::contains("+ paper.pdf"));

    marvin_cmd()
        .current_dir(project.path())
        .args(["sources", "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes in sources"));

    marvin_cmd()
        .current_dir(project.path())
        .args(["sources", "list", "--status", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("paper.pdf"))
        .stdout(predicate::str::contains("pending"));

    marvin_cmd()
        .current_dir(project.path())
        .args(["sources", "list", "--status", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tracked sources"));

    fs::write(project.path().join(".marvin/sources/paper.pdf"), b"%PDF-2.0").unwrap();
    marvin_cmd()
        .current_dir(project.path())
        .args(["sources", "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("~ paper.pdf"));

    fs::remove_file(project.path().join(".marvin/sources/paper.pdf")).unwrap();
    marvin_cmd()
        .current_dir(project.path())
        .args(["sources", "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- paper.pdf"))
        .stdout(predicate::str::contains(
            "[warn] 1 file(s) disappeared from sources",
        ));
}

#[test]
fn test_import_of_hand_edited_document() {
    let project = TempDir::new().expect("create temp dir");
    let input = TempDir::new().expect("create temp dir");
    init_project(project.path());
    let file = input.path().join("D-001.md");
    fs::write(
        &file,
        "---\nid: D-001\ntype: decision\ntitle: Use REST\ntags: api\n---\n\nBody\n",
    )
    .unwrap();

    marvin_cmd()
        .current_dir(project.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected: marvin-document"))
        .stdout(predicate::str::contains("Imported 1 document(s), copied 0 file(s)"));

    marvin_cmd()
        .current_dir(project.path())
        .args(["list", "--tag", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("D-001"));
}
