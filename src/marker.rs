//! Completion marker left after an install run.
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the marker file inside the marker directory.
pub const MARKER_FILE_NAME: &str = ".installed";

/// Write `<dir>/.installed` containing the human-readable local time
/// `at`, creating `dir` if needed, and return the marker path.
///
/// The content is informational; nothing reads it back.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_marker(dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(MARKER_FILE_NAME);
    fs::write(&path, at.to_string()).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
