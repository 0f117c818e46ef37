//! # CLI UI Module
//!
//! Styling and formatting layer for `marvin` output.
//!
//! Human output uses `[ok]`/`[err]` style prefixes and aligned tables; every
//! listing command also has a `--json` form for scripting. Colors follow
//! `--color` and respect `NO_COLOR`.
//!
//! ## Module Structure
//!
//! - `color`: Color mode detection and terminal capability checks
//! - `style`: Message types, prefixes, and styling functions
//! - `format`: Utility formatters (timestamps, truncation)
//! - `table`: Table rendering with comfy-table

pub mod color;
pub mod format;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use style::{MessageType, Style};
