//! # Gurukul Chat Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! is compiled as its own crate, so the helpers live here and are pulled in
//! with `mod common;`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::{Path, PathBuf};

/// # Get Gurukul Chat Command (`chat_cmd`)
///
/// An `assert_cmd::Command` for the compiled `gurukul-chat` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn chat_cmd() -> Command {
    Command::cargo_bin("gurukul-chat").expect("Failed to find gurukul-chat binary for testing")
}

/// Writes `content` as a config file in `dir` and returns its path.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("gurukul-chat.toml");
    std::fs::write(&path, content).expect("Failed to write test config");
    path
}

/// A config with typing delays switched off, so tests never sleep.
pub const NO_DELAY_CONFIG: &str = r#"
[pacing]
min_delay_ms = 0
max_delay_ms = 0
"#;
