//! Integration tests for polyrun
//!
//! These tests run real compilers and interpreters, so python3, gcc, g++,
//! javac/java, node and go must be on PATH.
//! Run with: cargo test -p polyrun --features integration-tests

#![cfg(feature = "integration-tests")]

use std::fs;
use std::path::Path;

use polyrun::{Config, Runner};

mod config_loading;
mod languages;
mod pipeline;
mod submission;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Helper to get fixture file content
pub(crate) fn fixture_source(name: &str) -> String {
    let path = format!("{FIXTURES_PATH}/sources/{name}");
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

/// Runner whose job directories live under `base`
pub(crate) fn test_runner(base: &Path) -> Runner {
    Runner::new(Config::default().with_base_dir(base))
}

/// Number of job directories left under `base`
pub(crate) fn job_dirs(base: &Path) -> usize {
    fs::read_dir(base).map(|dir| dir.count()).unwrap_or(0)
}

pub(crate) fn inputs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
