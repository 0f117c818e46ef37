//! # marvin CLI
//!
//! Command-line front end for `marvin-core`: project setup, document
//! CRUD, source tracking and imports.
//! Run `marvin --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
