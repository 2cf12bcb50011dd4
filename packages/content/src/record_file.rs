//! Reading and rewriting individual content files.
//!
//! Raw records keep their original key order (`serde_json`'s
//! `preserve_order`), so rewriting a file after enrichment only adds the
//! new keys and leaves the author's layout intact.

use std::path::Path;

use crate::{ContentError, RawRecord, atomic};

/// Reads a content file into a raw JSON object.
///
/// # Errors
///
/// Returns [`ContentError::Io`] if the file cannot be read,
/// [`ContentError::Json`] if it is not valid JSON, and
/// [`ContentError::NotAnObject`] if the top-level value is not an object.
pub fn read_raw_record(path: &Path) -> Result<RawRecord, ContentError> {
    let content = std::fs::read_to_string(path)?;
    parse_raw_record(&content, path)
}

/// Parses file contents into a raw JSON object.
///
/// # Errors
///
/// Returns [`ContentError::Json`] or [`ContentError::NotAnObject`].
pub fn parse_raw_record(content: &str, path: &Path) -> Result<RawRecord, ContentError> {
    match serde_json::from_str::<serde_json::Value>(content)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(ContentError::NotAnObject(path.to_path_buf())),
    }
}

/// Serializes a raw record the way content files are authored: two-space
/// indentation with a trailing newline.
///
/// # Errors
///
/// Returns [`ContentError::Json`] if serialization fails.
pub fn render_raw_record(record: &RawRecord) -> Result<String, ContentError> {
    let mut rendered = serde_json::to_string_pretty(record)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Atomically rewrites a content file with `record`.
///
/// # Errors
///
/// Returns [`ContentError`] if serialization or the atomic write fails.
pub fn write_raw_record(path: &Path, record: &RawRecord) -> Result<(), ContentError> {
    let rendered = render_raw_record(record)?;
    atomic::write_atomic(path, rendered.as_bytes())?;
    Ok(())
}

/// Returns the identifying base name of a content file (`cafe-a` for
/// `paris/cafe-a.json`).
#[must_use]
pub fn file_stem(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.strip_suffix(crate::collect::CONTENT_SUFFIX).unwrap_or(name))
        .unwrap_or_default()
        .to_string()
}
