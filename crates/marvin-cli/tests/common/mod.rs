//! Shared test utilities for marvin-cli integration tests.

use std::path::Path;

use assert_cmd::Command;

/// Get a Command for the marvin binary with colors off.
#[allow(deprecated)]
pub fn marvin_cmd() -> Command {
    let mut cmd = Command::cargo_bin("marvin").expect("marvin binary should exist");
    cmd.env("MARVIN_COLOR", "never")
        .env_remove("MARVIN_PROJECT")
        .env_remove("MARVIN_VERBOSE");
    cmd
}

/// Run `marvin init` in `dir`.
#[allow(dead_code)]
pub fn init_project(dir: &Path) {
    marvin_cmd()
        .current_dir(dir)
        .args(["init", "--name", "test"])
        .assert()
        .success();
}

/// Write a document file with minimal frontmatter.
#[allow(dead_code)]
pub fn write_doc(path: &Path, id: &str, doc_type: &str, title: &str, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    let text = format!(
        "---\nid: {}\ntype: {}\ntitle: {}\nstatus: open\n---\n\n{}\n",
        id, doc_type, title, body
    );
    std::fs::write(path, text).expect("write document");
}
