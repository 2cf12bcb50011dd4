//! Recursive discovery of content files under a content root.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ContentError;

/// File name suffix of cafe content files.
pub const CONTENT_SUFFIX: &str = ".json";

/// Returns `true` if the path names a content file.
#[must_use]
pub fn is_content_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(CONTENT_SUFFIX))
}

/// Returns every content file under `root`, recursively, in lexicographic
/// path order.
///
/// Symlinks are not followed. Any traversal failure aborts the whole
/// collection; partial results are never returned.
///
/// # Errors
///
/// Returns [`ContentError::RootNotFound`] if `root` does not exist,
/// [`ContentError::NotADirectory`] if it is a file, and
/// [`ContentError::Walk`] if any directory below it cannot be read.
pub fn collect_content_files(root: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ContentError::RootNotFound(root.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Err(ContentError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() && is_content_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    files.dedup();

    log::debug!(
        "Collected {} content files under {}",
        files.len(),
        root.display()
    );

    Ok(files)
}
