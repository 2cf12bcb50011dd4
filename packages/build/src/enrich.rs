//! Geocode enrichment with persistence into the source file.
//!
//! Resolved coordinates are written back into the record's content file, so
//! the next build sees them and makes no upstream call for that record.
//! Every failure is soft: the record continues without coordinates and the
//! problem is reported as an [`EnrichWarning`].

use std::fmt;
use std::path::Path;

use cafeco_cafe_models::{CafeField, CafeRecord, Coordinates};
use cafeco_content::RawRecord;
use cafeco_content::record_file::write_raw_record;
use cafeco_geocoder::Geocoder;
use serde_json::Value;

/// Why a record that needed coordinates did not get them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichWarning {
    /// No geocoding credential was configured.
    NoCredential,
    /// The service answered but could not resolve the address.
    Unresolved,
    /// The geocoding call failed.
    Failed {
        /// The underlying error, rendered.
        message: String,
    },
    /// Coordinates were resolved but could not be written back.
    PersistFailed {
        /// The underlying error, rendered.
        message: String,
    },
}

impl fmt::Display for EnrichWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredential => f.write_str("geocoding skipped: no API key configured"),
            Self::Unresolved => f.write_str("address could not be resolved"),
            Self::Failed { message } => write!(f, "geocoding failed: {message}"),
            Self::PersistFailed { message } => {
                write!(f, "could not save coordinates to source file: {message}")
            }
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichOutcome {
    /// The record already has coordinates.
    NotNeeded,
    /// Enrichment is turned off for this run.
    Disabled,
    /// Coordinates were resolved and applied.
    Geocoded {
        coordinates: Coordinates,
        /// Set when the write-back failed; the in-memory record still has
        /// the coordinates.
        warning: Option<EnrichWarning>,
    },
    /// The record continues without coordinates.
    Skipped(EnrichWarning),
}

impl EnrichOutcome {
    /// The warning to report for this record, if any.
    #[must_use]
    pub const fn warning(&self) -> Option<&EnrichWarning> {
        match self {
            Self::Skipped(warning)
            | Self::Geocoded {
                warning: Some(warning),
                ..
            } => Some(warning),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_geocoded(&self) -> bool {
        matches!(self, Self::Geocoded { .. })
    }
}

enum Mode {
    Off,
    NoCredential,
    On(Box<dyn Geocoder>),
}

/// Applies a [`Geocoder`] to records that lack coordinates.
pub struct Enricher {
    mode: Mode,
}

impl Enricher {
    /// Enriches with `geocoder`.
    #[must_use]
    pub fn new(geocoder: Box<dyn Geocoder>) -> Self {
        Self {
            mode: Mode::On(geocoder),
        }
    }

    /// Enrichment was requested but no credential is available. Every
    /// record that needs coordinates gets [`EnrichWarning::NoCredential`].
    #[must_use]
    pub const fn without_credential() -> Self {
        Self {
            mode: Mode::NoCredential,
        }
    }

    /// Enrichment is turned off entirely; nothing is reported.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { mode: Mode::Off }
    }

    /// Wraps an optional geocoder, treating `None` as a missing credential.
    #[must_use]
    pub fn from_option(geocoder: Option<Box<dyn Geocoder>>) -> Self {
        geocoder.map_or_else(Self::without_credential, Self::new)
    }

    /// Returns `true` if a geocoder is configured.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.mode, Mode::On(_))
    }

    /// Resolves coordinates for `record` if it has none, persisting them
    /// into `raw` and the file at `path`.
    pub async fn enrich(
        &self,
        path: &Path,
        raw: &mut RawRecord,
        record: &mut CafeRecord,
    ) -> EnrichOutcome {
        if !record.needs_geocoding() {
            return EnrichOutcome::NotNeeded;
        }

        let geocoder = match &self.mode {
            Mode::Off => return EnrichOutcome::Disabled,
            Mode::NoCredential => {
                let warning = EnrichWarning::NoCredential;
                log::warn!("{}: {warning}", path.display());
                return EnrichOutcome::Skipped(warning);
            }
            Mode::On(geocoder) => geocoder,
        };

        log::debug!(
            "Geocoding {} via {}: {}",
            record.slug,
            geocoder.name(),
            record.address
        );

        let coordinates = match geocoder.geocode(&record.address).await {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => {
                let warning = EnrichWarning::Unresolved;
                log::warn!("{}: {warning}", path.display());
                return EnrichOutcome::Skipped(warning);
            }
            Err(e) => {
                let warning = EnrichWarning::Failed {
                    message: e.to_string(),
                };
                log::warn!("{}: {warning}", path.display());
                return EnrichOutcome::Skipped(warning);
            }
        };

        record.set_coordinates(coordinates);
        raw.insert(CafeField::Lat.to_string(), Value::from(coordinates.lat));
        raw.insert(CafeField::Lng.to_string(), Value::from(coordinates.lng));

        let warning = match write_raw_record(path, raw) {
            Ok(()) => {
                log::info!(
                    "Geocoded {} -> ({}, {})",
                    record.slug,
                    coordinates.lat,
                    coordinates.lng
                );
                None
            }
            Err(e) => {
                let warning = EnrichWarning::PersistFailed {
                    message: e.to_string(),
                };
                log::warn!("{}: {warning}", path.display());
                Some(warning)
            }
        };

        EnrichOutcome::Geocoded {
            coordinates,
            warning,
        }
    }
}
