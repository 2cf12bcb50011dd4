#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Content file discovery, legacy normalization, and schema validation for
//! cafe records.
//!
//! A content root holds one JSON file per cafe, usually grouped into
//! per-city directories (`data/cafes/paris/cafe-a.json`). This crate:
//!
//! - discovers those files ([`collect`]),
//! - reads and rewrites them without disturbing key order ([`record_file`],
//!   [`atomic`]),
//! - maps legacy field names onto the current schema ([`normalize`]),
//! - validates a raw record into a [`cafeco_cafe_models::CafeRecord`] with
//!   a complete list of errors and warnings ([`validate`]),
//! - scaffolds new content files for community submissions
//!   ([`submission`]).

pub mod atomic;
pub mod collect;
pub mod normalize;
pub mod paths;
pub mod record_file;
pub mod submission;
pub mod validate;

use std::path::PathBuf;

pub use collect::collect_content_files;
pub use normalize::normalize_legacy_fields;
pub use validate::{FieldError, RecordValidator, Validation, ValidationWarning, ValidatorConfig};

/// A raw, untyped content record as parsed from disk.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Errors from content file operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The content root does not exist.
    #[error("Content root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The content root exists but is not a directory.
    #[error("Content root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Directory traversal failed (e.g., unreadable subdirectory).
    #[error("Failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A content file parsed as JSON but is not an object.
    #[error("Expected a JSON object in {}", .0.display())]
    NotAnObject(PathBuf),

    /// Refused to overwrite an existing content file.
    #[error("Content file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A submission could not be turned into a content file.
    #[error("Invalid submission: {message}")]
    InvalidSubmission {
        /// Description of what is wrong with the submission.
        message: String,
    },
}
