#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for content and published datasets.
//!
//! All defaults are relative to the project root. The content root can be
//! overridden with the `CAFECO_CONTENT_DIR` environment variable.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the default content root.
pub const CONTENT_DIR_ENV: &str = "CAFECO_CONTENT_DIR";

/// File name of the published dataset.
pub const DATASET_FILE_NAME: &str = "cafes.json";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the content root: `CAFECO_CONTENT_DIR` if set, otherwise
/// `data/cafes/`.
#[must_use]
pub fn content_dir() -> PathBuf {
    std::env::var(CONTENT_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map_or_else(|| project_root().join("data").join("cafes"), PathBuf::from)
}

/// Returns the `public/` directory that holds static assets.
#[must_use]
pub fn public_dir() -> PathBuf {
    project_root().join("public")
}

/// Returns the published dataset path consumed by the presentation layer.
#[must_use]
pub fn published_dataset_path() -> PathBuf {
    public_dir().join(DATASET_FILE_NAME)
}

/// Returns the development mirror of the published dataset.
#[must_use]
pub fn dev_dataset_path() -> PathBuf {
    project_root()
        .join("src")
        .join("data")
        .join(DATASET_FILE_NAME)
}

/// Returns every location the builder publishes to by default.
#[must_use]
pub fn default_outputs() -> Vec<PathBuf> {
    vec![published_dataset_path(), dev_dataset_path()]
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
