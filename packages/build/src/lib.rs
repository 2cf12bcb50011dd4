#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Builds the published cafe dataset from a content root.
//!
//! A build collects every content file, normalizes legacy fields,
//! validates, rejects duplicate ids, geocodes records that lack
//! coordinates, sorts by `(city, name)` and atomically writes the result to
//! every configured output. Per-record problems never abort the batch; they
//! are collected into the [`BuildReport`]. Only an unreadable content root
//! (or strict mode with rejections) fails the run.

pub mod enrich;
pub mod progress;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cafeco_cafe_models::{CafeRecord, sort_records};
use cafeco_content::{
    ContentError, FieldError, RawRecord, RecordValidator, Validation, ValidationWarning,
    ValidatorConfig, atomic, collect_content_files, normalize_legacy_fields, paths,
    record_file::read_raw_record,
};

use crate::enrich::{EnrichWarning, Enricher};
use crate::progress::ProgressCallback;

/// Errors that abort a build or validate run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The content root could not be collected.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Writing an output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the dataset failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Strict mode is on and at least one record was rejected. No output
    /// was written.
    #[error("{rejected} record(s) rejected in strict mode; dataset not written")]
    StrictModeRejections {
        /// Number of rejected files.
        rejected: usize,
        /// The full report of the aborted build.
        report: Box<BuildReport>,
    },
}

/// Why a content file was left out of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The file could not be read.
    Unreadable {
        message: String,
    },
    /// The file is not a JSON object.
    Malformed {
        message: String,
    },
    /// The record failed validation.
    Invalid(Vec<FieldError>),
    /// Another file already defines this id.
    DuplicateId {
        id: String,
        /// The file that claimed the id first.
        first: PathBuf,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { message } => write!(f, "unreadable: {message}"),
            Self::Malformed { message } => write!(f, "malformed: {message}"),
            Self::Invalid(errors) => {
                for (i, error) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{error}")?;
                }
                Ok(())
            }
            Self::DuplicateId { id, first } => {
                write!(f, "duplicate id \"{id}\" (first defined in {})", first.display())
            }
        }
    }
}

/// A non-fatal problem attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    Validation(ValidationWarning),
    Enrichment(EnrichWarning),
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(warning) => warning.fmt(f),
            Self::Enrichment(warning) => warning.fmt(f),
        }
    }
}

/// Outcome of one content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// The record is part of the dataset.
    Accepted {
        /// The record's id.
        id: String,
    },
    /// The record was excluded.
    Rejected(RejectReason),
}

/// Per-file entry of a run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub warnings: Vec<BuildWarning>,
    /// Coordinates were resolved for this record during the run.
    pub geocoded: bool,
}

impl FileReport {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.status, FileStatus::Accepted { .. })
    }

    #[must_use]
    pub const fn reject_reason(&self) -> Option<&RejectReason> {
        match &self.status {
            FileStatus::Rejected(reason) => Some(reason),
            FileStatus::Accepted { .. } => None,
        }
    }
}

/// Summary counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    /// Content files found under the root.
    pub discovered: usize,
    /// Files whose record made it into the dataset.
    pub accepted: usize,
    /// Files that were excluded.
    pub rejected: usize,
    /// Total warnings across all files.
    pub warnings: usize,
    /// Records geocoded during the run.
    pub geocoded: usize,
}

impl RunCounts {
    fn tally(files: &[FileReport]) -> Self {
        files.iter().fold(
            Self {
                discovered: files.len(),
                ..Self::default()
            },
            |mut counts, file| {
                if file.is_accepted() {
                    counts.accepted += 1;
                } else {
                    counts.rejected += 1;
                }
                counts.warnings += file.warnings.len();
                counts.geocoded += usize::from(file.geocoded);
                counts
            },
        )
    }
}

impl fmt::Display for RunCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} valid, {} rejected, {} warnings, {} geocoded",
            self.discovered, self.accepted, self.rejected, self.warnings, self.geocoded
        )
    }
}

/// Result of a completed build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// One entry per content file, in collection order.
    pub files: Vec<FileReport>,
    pub counts: RunCounts,
    /// The published records, in dataset order.
    pub records: Vec<CafeRecord>,
    /// Outputs that were written. Empty when the build was aborted.
    pub outputs: Vec<PathBuf>,
}

impl BuildReport {
    /// Files that were excluded from the dataset.
    pub fn rejections(&self) -> impl Iterator<Item = (&Path, &RejectReason)> {
        self.files
            .iter()
            .filter_map(|file| file.reject_reason().map(|reason| (file.path.as_path(), reason)))
    }
}

/// Settings for [`run_build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory tree holding one JSON file per cafe.
    pub content_root: PathBuf,
    /// Every path the dataset is written to.
    pub outputs: Vec<PathBuf>,
    /// Public asset directory for the image existence check.
    pub asset_root: Option<PathBuf>,
    /// Fail the build if any record is rejected.
    pub strict: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            content_root: paths::content_dir(),
            outputs: paths::default_outputs(),
            asset_root: Some(paths::public_dir()),
            strict: false,
        }
    }
}

/// Settings for [`run_validate`].
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub content_root: PathBuf,
    pub asset_root: Option<PathBuf>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            content_root: paths::content_dir(),
            asset_root: Some(paths::public_dir()),
        }
    }
}

/// Result of a validate-only run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub files: Vec<FileReport>,
    pub counts: RunCounts,
}

impl ValidationSummary {
    /// Returns `true` if any file has errors. Warnings alone do not count.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.counts.rejected > 0
    }
}

/// A record that passed validation and the duplicate-id check.
struct Candidate {
    /// File contents as read, before legacy normalization.
    raw: RawRecord,
    record: CafeRecord,
}

/// Reads, normalizes, and validates files, tracking ids across calls so
/// the first file (in path order) to claim an id wins.
struct Checker {
    validator: RecordValidator,
    seen_ids: BTreeMap<String, PathBuf>,
}

impl Checker {
    fn new(asset_root: Option<PathBuf>) -> Self {
        Self {
            validator: RecordValidator::new(ValidatorConfig {
                asset_root,
                ..ValidatorConfig::default()
            }),
            seen_ids: BTreeMap::new(),
        }
    }

    fn check(&mut self, path: &Path) -> (FileReport, Option<Candidate>) {
        let mut warnings = Vec::new();

        let (status, candidate) = match self.accept(path, &mut warnings) {
            Ok(candidate) => (
                FileStatus::Accepted {
                    id: candidate.record.id.clone(),
                },
                Some(candidate),
            ),
            Err(reason) => (FileStatus::Rejected(reason), None),
        };

        let report = FileReport {
            path: path.to_path_buf(),
            status,
            warnings,
            geocoded: false,
        };
        (report, candidate)
    }

    fn accept(
        &mut self,
        path: &Path,
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<Candidate, RejectReason> {
        let mut raw = read_raw_record(path).map_err(|e| match e {
            ContentError::Io(e) => RejectReason::Unreadable {
                message: e.to_string(),
            },
            e => RejectReason::Malformed {
                message: e.to_string(),
            },
        })?;

        // Write-back must only add coordinates to what the author wrote.
        let original = raw.clone();
        normalize_legacy_fields(&mut raw);

        let validation = self.validator.validate(&raw, path);
        warnings.extend(
            validation
                .warnings()
                .iter()
                .cloned()
                .map(BuildWarning::Validation),
        );

        let record = match validation {
            Validation::Valid { record, .. } => *record,
            Validation::Invalid { errors, .. } => return Err(RejectReason::Invalid(errors)),
        };

        if let Some(first) = self.seen_ids.get(&record.id) {
            return Err(RejectReason::DuplicateId {
                id: record.id,
                first: first.clone(),
            });
        }
        self.seen_ids.insert(record.id.clone(), path.to_path_buf());

        Ok(Candidate {
            raw: original,
            record,
        })
    }
}

fn log_file(report: &FileReport) {
    let path = report.path.display();
    match &report.status {
        FileStatus::Accepted { id } => log::debug!("{path}: ok ({id})"),
        FileStatus::Rejected(reason) => log::warn!("{path}: rejected: {reason}"),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Renders records as the published dataset: a pretty-printed JSON array
/// with two-space indentation and a trailing newline.
///
/// # Errors
///
/// Returns [`BuildError::Json`] if serialization fails.
pub fn render_dataset(records: &[CafeRecord]) -> Result<String, BuildError> {
    let mut rendered = serde_json::to_string_pretty(records)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Runs the full build pipeline.
///
/// # Errors
///
/// Returns [`BuildError::Content`] if the content root is missing or
/// unreadable, [`BuildError::StrictModeRejections`] if `options.strict` is
/// set and any record was rejected, and [`BuildError::Io`] if an output
/// cannot be written.
pub async fn run_build(
    options: &BuildOptions,
    enricher: &Enricher,
    progress: Arc<dyn ProgressCallback>,
) -> Result<BuildReport, BuildError> {
    let files = collect_content_files(&options.content_root)?;
    log::info!(
        "Building dataset from {} content files in {}",
        files.len(),
        options.content_root.display()
    );

    progress.set_total(files.len() as u64);

    let mut checker = Checker::new(options.asset_root.clone());
    let mut reports = Vec::with_capacity(files.len());
    let mut records = Vec::with_capacity(files.len());

    for path in &files {
        progress.set_message(file_label(path));

        let (mut report, candidate) = checker.check(path);

        if let Some(Candidate {
            mut raw,
            mut record,
        }) = candidate
        {
            let outcome = enricher.enrich(path, &mut raw, &mut record).await;
            report.geocoded = outcome.is_geocoded();
            if let Some(warning) = outcome.warning() {
                report
                    .warnings
                    .push(BuildWarning::Enrichment(warning.clone()));
            }
            records.push(record);
        }

        log_file(&report);
        reports.push(report);
        progress.inc(1);
    }

    sort_records(&mut records);

    let counts = RunCounts::tally(&reports);
    let mut report = BuildReport {
        files: reports,
        counts,
        records,
        outputs: Vec::new(),
    };

    if options.strict && counts.rejected > 0 {
        progress.finish(format!("{} rejected", counts.rejected));
        log::error!("Strict mode: {} record(s) rejected", counts.rejected);
        return Err(BuildError::StrictModeRejections {
            rejected: counts.rejected,
            report: Box::new(report),
        });
    }

    let rendered = render_dataset(&report.records)?;
    for output in &options.outputs {
        atomic::write_atomic(output, rendered.as_bytes())?;
        log::info!(
            "Wrote {} records to {}",
            report.records.len(),
            output.display()
        );
    }
    report.outputs.clone_from(&options.outputs);

    progress.finish(counts.to_string());
    log::info!("Build complete: {counts}");

    Ok(report)
}

/// Runs collection, normalization and validation only. Nothing is
/// geocoded or written.
///
/// Duplicate ids are reported as errors.
///
/// # Errors
///
/// Returns [`BuildError::Content`] if the content root is missing or
/// unreadable.
pub fn run_validate(options: &ValidateOptions) -> Result<ValidationSummary, BuildError> {
    let files = collect_content_files(&options.content_root)?;
    log::info!(
        "Validating {} content files in {}",
        files.len(),
        options.content_root.display()
    );

    let mut checker = Checker::new(options.asset_root.clone());
    let reports: Vec<FileReport> = files
        .iter()
        .map(|path| {
            let (report, _) = checker.check(path);
            log_file(&report);
            report
        })
        .collect();

    let counts = RunCounts::tally(&reports);
    log::info!("Validation complete: {counts}");

    Ok(ValidationSummary {
        files: reports,
        counts,
    })
}
