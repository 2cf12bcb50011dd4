//! Schema validation of raw content records.
//!
//! Every field is checked independently so a single pass reports the full
//! set of problems in a file. Missing required fields are reported as
//! [`FieldError::Missing`], never as [`FieldError::Invalid`].

use std::fmt;
use std::path::{Path, PathBuf};

use cafeco_cafe_models::{
    CafeField, CafeRecord, DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS, IMAGE_PREFIX,
    NAME_MAX_CHARS, is_valid_lat, is_valid_lng, is_valid_slug,
};
use serde_json::Value;

use crate::RawRecord;
use crate::record_file::file_stem;

/// Validator settings.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Prefix every `image` path must start with.
    pub image_prefix: String,
    /// Directory that `image` paths resolve against. When set, images that
    /// do not exist on disk produce [`ValidationWarning::MissingAsset`].
    pub asset_root: Option<PathBuf>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            image_prefix: IMAGE_PREFIX.to_string(),
            asset_root: None,
        }
    }
}

impl ValidatorConfig {
    /// Enables the on-disk image check against `root`.
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }
}

/// A validation error for a single field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// A required field is absent or `null`.
    #[error("{field}: missing required field")]
    Missing {
        /// The missing field.
        field: CafeField,
    },

    /// A field is present but its value is malformed.
    #[error("{field}: {reason}")]
    Invalid {
        /// The offending field.
        field: CafeField,
        /// Human-readable reason.
        reason: String,
    },

    /// The record's slug differs from its file's base name.
    #[error("slug mismatch: slug \"{slug}\" does not match file name \"{file_stem}\"")]
    SlugMismatch {
        /// Slug declared in the record.
        slug: String,
        /// Base name of the source file.
        file_stem: String,
    },
}

impl FieldError {
    /// The field the error is about.
    #[must_use]
    pub const fn field(&self) -> CafeField {
        match self {
            Self::Missing { field } | Self::Invalid { field, .. } => *field,
            Self::SlugMismatch { .. } => CafeField::Slug,
        }
    }

    fn invalid(field: CafeField, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A non-fatal issue. Records with only warnings are still published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The raw record contains a key the schema does not define.
    UnknownField {
        /// The unrecognized key.
        field: String,
    },
    /// The referenced image does not exist under the asset root.
    MissingAsset {
        /// Path that was checked.
        path: PathBuf,
    },
    /// Only one of `lat`/`lng` is set.
    PartialCoordinates,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { field } => write!(f, "unknown field \"{field}\""),
            Self::MissingAsset { path } => write!(f, "image not found: {}", path.display()),
            Self::PartialCoordinates => f.write_str("only one of lat/lng is set"),
        }
    }
}

/// Result of validating one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The record passed every check.
    Valid {
        /// The typed record.
        record: Box<CafeRecord>,
        /// Non-fatal issues.
        warnings: Vec<ValidationWarning>,
    },
    /// At least one check failed.
    Invalid {
        /// Every failed check, in field order.
        errors: Vec<FieldError>,
        /// Non-fatal issues.
        warnings: Vec<ValidationWarning>,
    },
}

impl Validation {
    /// Returns `true` for [`Validation::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Errors, empty for valid records.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Valid { .. } => &[],
            Self::Invalid { errors, .. } => errors,
        }
    }

    /// Warnings collected regardless of validity.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        match self {
            Self::Valid { warnings, .. } | Self::Invalid { warnings, .. } => warnings,
        }
    }
}

/// Validates raw records against the cafe schema.
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    config: ValidatorConfig,
}

impl RecordValidator {
    #[must_use]
    pub const fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates `raw`, read from `source`.
    ///
    /// Expects legacy fields to have been normalized already (see
    /// [`crate::normalize_legacy_fields`]).
    #[must_use]
    pub fn validate(&self, raw: &RawRecord, source: &Path) -> Validation {
        let mut fields = FieldReader::new(raw);

        let id = fields.optional_str(CafeField::Id);
        if id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            fields.reject(CafeField::Id, "must not be empty");
        }

        let name = fields.required_str(CafeField::Name);
        if let Some(name) = &name {
            let len = name.trim().chars().count();
            if len == 0 {
                fields.reject(CafeField::Name, "must not be empty");
            } else if name.chars().count() > NAME_MAX_CHARS {
                fields.reject(
                    CafeField::Name,
                    format!("must be at most {NAME_MAX_CHARS} characters"),
                );
            }
        }

        let slug = fields.required_str(CafeField::Slug);
        if let Some(slug) = &slug
            && !is_valid_slug(slug)
        {
            fields.reject(
                CafeField::Slug,
                "must contain only lowercase letters, digits, and hyphens",
            );
        }

        let description = fields.required_str(CafeField::Description);
        if let Some(description) = &description {
            let len = description.chars().count();
            if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&len) {
                fields.reject(
                    CafeField::Description,
                    format!(
                        "must be {DESCRIPTION_MIN_CHARS}-{DESCRIPTION_MAX_CHARS} characters (got {len})"
                    ),
                );
            }
        }

        let city = fields.required_non_empty(CafeField::City);
        let country = fields.required_non_empty(CafeField::Country);
        let address = fields.required_non_empty(CafeField::Address);

        let website = fields.optional_str(CafeField::Website);
        if let Some(website) = &website
            && let Err(reason) = check_website(website)
        {
            fields.reject(CafeField::Website, reason);
        }

        let image = fields.required_str(CafeField::Image);
        if let Some(image) = &image
            && !image.starts_with(&self.config.image_prefix)
        {
            fields.reject(
                CafeField::Image,
                format!("must start with \"{}\"", self.config.image_prefix),
            );
        }

        let tags = fields.tags();

        let lat = fields.optional_coordinate(CafeField::Lat, is_valid_lat, "-90..90");
        let lng = fields.optional_coordinate(CafeField::Lng, is_valid_lng, "-180..180");

        let station = fields.optional_str(CafeField::Station);
        let featured = fields.optional_bool(CafeField::Featured);
        let contributor = fields.optional_str(CafeField::Contributor);

        let FieldReader {
            mut errors,
            mut warnings,
            ..
        } = fields;

        if let Some(slug) = &slug {
            let stem = file_stem(source);
            if *slug != stem {
                errors.push(FieldError::SlugMismatch {
                    slug: slug.clone(),
                    file_stem: stem,
                });
            }
        }

        for key in raw.keys() {
            if !CafeField::is_known(key) {
                warnings.push(ValidationWarning::UnknownField { field: key.clone() });
            }
        }

        if present(raw, CafeField::Lat) != present(raw, CafeField::Lng) {
            warnings.push(ValidationWarning::PartialCoordinates);
        }

        if let (Some(root), Some(image)) = (&self.config.asset_root, &image)
            && image.starts_with(&self.config.image_prefix)
        {
            let path = root.join(image.trim_start_matches('/'));
            if !path.is_file() {
                warnings.push(ValidationWarning::MissingAsset { path });
            }
        }

        match (name, slug, description, city, country, address, image, tags) {
            (
                Some(name),
                Some(slug),
                Some(description),
                Some(city),
                Some(country),
                Some(address),
                Some(image),
                Some(tags),
            ) if errors.is_empty() => Validation::Valid {
                record: Box::new(CafeRecord {
                    id: id.unwrap_or_else(|| slug.clone()),
                    name,
                    slug,
                    description,
                    city,
                    country,
                    address,
                    website,
                    image,
                    tags,
                    lat,
                    lng,
                    station,
                    featured,
                    contributor,
                }),
                warnings,
            },
            _ => Validation::Invalid { errors, warnings },
        }
    }
}

fn present(raw: &RawRecord, field: CafeField) -> bool {
    raw.get(field.as_ref()).is_some_and(|v| !v.is_null())
}

fn check_website(website: &str) -> Result<(), String> {
    let url = url::Url::parse(website).map_err(|e| format!("not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported URL scheme \"{other}\"")),
    }
}

/// Typed accessors over a raw record that accumulate errors instead of
/// stopping at the first one.
struct FieldReader<'a> {
    raw: &'a RawRecord,
    errors: Vec<FieldError>,
    warnings: Vec<ValidationWarning>,
}

impl<'a> FieldReader<'a> {
    const fn new(raw: &'a RawRecord) -> Self {
        Self {
            raw,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn get(&self, field: CafeField) -> Option<&'a Value> {
        self.raw.get(field.as_ref()).filter(|v| !v.is_null())
    }

    fn reject(&mut self, field: CafeField, reason: impl Into<String>) {
        self.errors.push(FieldError::invalid(field, reason));
    }

    fn required_str(&mut self, field: CafeField) -> Option<String> {
        match self.get(field) {
            None => {
                self.errors.push(FieldError::Missing { field });
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.reject(field, "expected a string");
                None
            }
        }
    }

    fn required_non_empty(&mut self, field: CafeField) -> Option<String> {
        let value = self.required_str(field)?;
        if value.trim().is_empty() {
            self.reject(field, "must not be empty");
        }
        Some(value)
    }

    fn optional_str(&mut self, field: CafeField) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.reject(field, "expected a string");
                None
            }
        }
    }

    fn optional_bool(&mut self, field: CafeField) -> Option<bool> {
        match self.get(field)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.reject(field, "expected a boolean");
                None
            }
        }
    }

    fn optional_coordinate(
        &mut self,
        field: CafeField,
        in_range: fn(f64) -> bool,
        range: &str,
    ) -> Option<f64> {
        let value = self.get(field)?;
        let Some(number) = value.as_f64() else {
            self.reject(field, "expected a number");
            return None;
        };
        if !in_range(number) {
            self.reject(field, format!("{number} is outside {range}"));
            return None;
        }
        Some(number)
    }

    fn tags(&mut self) -> Option<Vec<String>> {
        let field = CafeField::Tags;
        let items = match self.get(field) {
            None => {
                self.errors.push(FieldError::Missing { field });
                return None;
            }
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.reject(field, "expected an array of strings");
                return None;
            }
        };

        if items.is_empty() {
            self.reject(field, "must contain at least one tag");
            return None;
        }

        let mut tags = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(tag) if !tag.trim().is_empty() => tags.push(tag.to_string()),
                Some(_) => self.reject(field, format!("tag {i} is empty")),
                None => self.reject(field, format!("tag {i} is not a string")),
            }
        }

        (tags.len() == items.len()).then_some(tags)
    }
}
