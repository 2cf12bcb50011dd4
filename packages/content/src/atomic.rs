//! Atomic file replacement.
//!
//! Writes go to a temporary file in the destination directory and are then
//! renamed over the target, so readers only ever observe the old or the new
//! contents.

use std::io::Write as _;
use std::path::Path;

use crate::paths::ensure_dir;

/// Atomically replaces `path` with `bytes`, creating parent directories as
/// needed.
///
/// # Errors
///
/// Returns an I/O error if the temp file cannot be created, written,
/// synced, or renamed into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = temp_file_for(path)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Atomically creates `path` with `bytes`, failing with
/// [`std::io::ErrorKind::AlreadyExists`] if it is already present.
///
/// # Errors
///
/// Returns an I/O error if the target exists or any write step fails.
pub fn write_atomic_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = temp_file_for(path)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

fn temp_file_for(path: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;
    tempfile::Builder::new()
        .prefix(".cafeco-")
        .suffix(".tmp")
        .tempfile_in(dir)
}
