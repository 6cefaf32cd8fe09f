//! Subcommand implementations:
//! - `solve` - Estimate the components named by a task file
//! - `merge` - Merge task outputs into one solution
//! - `generate` - Write a random system as work units
//! - `demo` - Local end-to-end run against a direct solve

pub mod demo;
pub mod generate;
pub mod merge;
pub mod solve;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Write `content` to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Read a whole text file.
pub(crate) fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
