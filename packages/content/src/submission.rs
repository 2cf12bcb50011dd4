//! Scaffolding of new content files for community submissions.

use std::path::{Path, PathBuf};

use cafeco_cafe_models::{CafeField, IMAGE_PREFIX, city_slug, collation, is_valid_slug};
use serde_json::Value;

use crate::{ContentError, RawRecord, atomic, collect::CONTENT_SUFFIX, record_file};

/// Fields a contributor supplies for a new cafe.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub name: String,
    pub city: String,
    pub country: String,
    pub address: String,
    /// Explicit slug. Derived from the name when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub tags: Vec<String>,
    pub station: Option<String>,
    pub contributor: Option<String>,
}

/// Converts a display name into a slug: diacritics folded, ASCII lowercase
/// alphanumerics with single hyphens between words.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in collation::fold_diacritics(name).chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

impl Submission {
    /// The slug the content file will be named after.
    #[must_use]
    pub fn resolved_slug(&self) -> String {
        self.slug
            .as_deref()
            .map_or_else(|| slugify(&self.name), str::to_string)
    }

    /// Builds the raw record written to disk.
    ///
    /// The description is left empty when not supplied so the validator
    /// flags it until the contributor fills it in.
    #[must_use]
    pub fn to_raw_record(&self) -> RawRecord {
        let slug = self.resolved_slug();
        let city_dir = city_slug(&self.city);

        let mut raw = RawRecord::new();
        let mut put = |field: CafeField, value: Value| {
            raw.insert(field.to_string(), value);
        };

        put(CafeField::Id, Value::from(slug.clone()));
        put(CafeField::Name, Value::from(self.name.trim()));
        put(CafeField::Slug, Value::from(slug.clone()));
        put(
            CafeField::Description,
            Value::from(self.description.clone().unwrap_or_default()),
        );
        put(CafeField::City, Value::from(self.city.trim()));
        put(CafeField::Country, Value::from(self.country.trim()));
        put(CafeField::Address, Value::from(self.address.trim()));
        if let Some(website) = &self.website {
            put(CafeField::Website, Value::from(website.as_str()));
        }
        put(
            CafeField::Image,
            Value::from(format!("{IMAGE_PREFIX}{city_dir}/{slug}.jpg")),
        );
        put(
            CafeField::Tags,
            Value::Array(self.tags.iter().map(|t| Value::from(t.as_str())).collect()),
        );
        if let Some(station) = &self.station {
            put(CafeField::Station, Value::from(station.as_str()));
        }
        if let Some(contributor) = &self.contributor {
            put(CafeField::Contributor, Value::from(contributor.as_str()));
        }

        raw
    }
}

/// Writes a new content file for `submission` at
/// `<root>/<city-slug>/<slug>.json`.
///
/// # Errors
///
/// Returns [`ContentError::InvalidSubmission`] if the name or city cannot
/// produce a slug, [`ContentError::AlreadyExists`] if the file is already
/// present, and other [`ContentError`] variants on write failure.
pub fn scaffold_submission(root: &Path, submission: &Submission) -> Result<PathBuf, ContentError> {
    let slug = submission.resolved_slug();
    if !is_valid_slug(&slug) {
        return Err(ContentError::InvalidSubmission {
            message: format!("cannot derive a valid slug from \"{}\"", submission.name),
        });
    }

    let city_dir = city_slug(&submission.city);
    if city_dir.is_empty() {
        return Err(ContentError::InvalidSubmission {
            message: "city must not be empty".to_string(),
        });
    }

    let path = root.join(&city_dir).join(format!("{slug}{CONTENT_SUFFIX}"));
    let rendered = record_file::render_raw_record(&submission.to_raw_record())?;

    match atomic::write_atomic_new(&path, rendered.as_bytes()) {
        Ok(()) => {
            log::info!("Scaffolded {}", path.display());
            Ok(path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(ContentError::AlreadyExists(path))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::record_file::read_raw_record;

    fn submission() -> Submission {
        Submission {
            name: "Café du Marché".to_string(),
            city: "San Francisco".to_string(),
            country: "USA".to_string(),
            address: "1 Market St".to_string(),
            tags: vec!["wifi".to_string()],
            ..Submission::default()
        }
    }

    #[test]
    fn slugify_folds_accents_and_collapses_separators() {
        assert_eq!(slugify("Blue Bottle  Coffee!"), "blue-bottle-coffee");
        assert_eq!(slugify("--Sightglass--"), "sightglass");
        assert_eq!(slugify("Café du Marché"), "cafe-du-marche");
        assert_eq!(slugify("Łódź Kawiarnia"), "lodz-kawiarnia");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn scaffolds_under_city_directory() {
        let temp = tempdir().unwrap();
        let path = scaffold_submission(temp.path(), &submission()).unwrap();
        assert_eq!(path, temp.path().join("san-francisco/cafe-du-marche.json"));

        let raw = read_raw_record(&path).unwrap();
        assert_eq!(raw["slug"], "cafe-du-marche");
        assert_eq!(raw["image"], "/images/san-francisco/cafe-du-marche.jpg");
        assert_eq!(raw["tags"], serde_json::json!(["wifi"]));
        assert!(!raw.contains_key("website"));
    }

    #[test]
    fn refuses_to_overwrite() {
        let temp = tempdir().unwrap();
        scaffold_submission(temp.path(), &submission()).unwrap();
        let err = scaffold_submission(temp.path(), &submission()).unwrap_err();
        assert!(matches!(err, ContentError::AlreadyExists(_)));
    }

    #[test]
    fn rejects_unsluggable_names() {
        let temp = tempdir().unwrap();
        let mut bad = submission();
        bad.name = "???".to_string();
        let err = scaffold_submission(temp.path(), &bad).unwrap_err();
        assert!(matches!(err, ContentError::InvalidSubmission { .. }));
    }

    #[test]
    fn explicit_slug_wins() {
        let mut sub = submission();
        sub.slug = Some("marche".to_string());
        assert_eq!(sub.to_raw_record()["id"], "marche");
    }
}
