#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Read-side handle over the published cafe dataset.
//!
//! A [`Dataset`] is constructed explicitly and passed to whoever needs it;
//! there is no process-wide cache. Its contents are a snapshot taken at
//! [`Dataset::loaded_at`] and only change when [`Dataset::refresh`] is
//! called. Callers that serve the data for a long time decide how stale
//! they tolerate with [`Dataset::is_stale`].
//!
//! Records keep the published order (`(city, name)`), and every query below
//! returns results in that order unless stated otherwise.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cafeco_cafe_models::{CafeRecord, city_slug, collation};
use thiserror::Error;

/// Errors from loading the published dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The dataset file is not a JSON array of cafe records.
    #[error("Failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The dataset was built in memory and has no file to reload from.
    #[error("Dataset has no backing file")]
    NotBacked,
}

/// Per-city aggregate for city listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySummary {
    /// City name as first seen in the dataset.
    pub name: String,
    /// Route slug (see [`city_slug`]).
    pub slug: String,
    /// Country of the first record seen for this city.
    pub country: String,
    /// Number of cafes in the city.
    pub count: usize,
}

/// An explicitly loaded snapshot of the published dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<CafeRecord>,
    source: Option<PathBuf>,
    loaded_at: Instant,
}

fn read_records(path: &Path) -> Result<Vec<CafeRecord>, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl Dataset {
    /// Loads the published dataset at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if the file cannot be read and
    /// [`DatasetError::Json`] if it does not parse.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let path = path.into();
        let records = read_records(&path)?;
        log::debug!("Loaded {} cafes from {}", records.len(), path.display());
        Ok(Self {
            records,
            source: Some(path),
            loaded_at: Instant::now(),
        })
    }

    /// Wraps records that are already in published order.
    #[must_use]
    pub fn from_records(records: Vec<CafeRecord>) -> Self {
        Self {
            records,
            source: None,
            loaded_at: Instant::now(),
        }
    }

    /// Reloads from the backing file. On failure the current snapshot is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::NotBacked`] for in-memory datasets, otherwise
    /// the same errors as [`Self::load`].
    pub fn refresh(&mut self) -> Result<(), DatasetError> {
        let path = self.source.as_deref().ok_or(DatasetError::NotBacked)?;
        self.records = read_records(path)?;
        self.loaded_at = Instant::now();
        log::debug!("Refreshed {} cafes from {}", self.records.len(), path.display());
        Ok(())
    }

    /// When the current snapshot was taken.
    #[must_use]
    pub const fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    /// Returns `true` if the snapshot is older than `max_age`.
    #[must_use]
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.loaded_at.elapsed() > max_age
    }

    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn records(&self) -> &[CafeRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<&CafeRecord> {
        self.records.iter().find(|r| r.slug == slug)
    }

    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&CafeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Cities with their cafe counts, busiest first. Ties are broken by
    /// city name.
    #[must_use]
    pub fn cities(&self) -> Vec<CitySummary> {
        let mut by_slug: BTreeMap<String, CitySummary> = BTreeMap::new();
        for record in &self.records {
            by_slug
                .entry(record.city_slug())
                .or_insert_with_key(|slug| CitySummary {
                    name: record.city.clone(),
                    slug: slug.clone(),
                    country: record.country.clone(),
                    count: 0,
                })
                .count += 1;
        }

        let mut cities: Vec<CitySummary> = by_slug.into_values().collect();
        cities.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| collation::compare(&a.name, &b.name))
        });
        cities
    }

    /// Cafes whose city slug is `slug`.
    #[must_use]
    pub fn in_city(&self, slug: &str) -> Vec<&CafeRecord> {
        self.records
            .iter()
            .filter(|r| city_slug(&r.city) == slug)
            .collect()
    }

    /// Distinct tags used by cafes in the city, in first-seen order.
    #[must_use]
    pub fn city_tags(&self, slug: &str) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for record in self.in_city(slug) {
            for tag in &record.tags {
                if !tags.contains(&tag.as_str()) {
                    tags.push(tag);
                }
            }
        }
        tags
    }

    /// Up to `limit` featured cafes.
    #[must_use]
    pub fn featured(&self, limit: usize) -> Vec<&CafeRecord> {
        self.records
            .iter()
            .filter(|r| r.is_featured())
            .take(limit)
            .collect()
    }

    /// Up to `limit` other cafes in the same city (by slug) as `record`.
    #[must_use]
    pub fn related(&self, record: &CafeRecord, limit: usize) -> Vec<&CafeRecord> {
        let city = record.city_slug();
        self.records
            .iter()
            .filter(|r| r.id != record.id && r.city_slug() == city)
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn cafe(id: &str, city: &str, tags: &[&str], featured: bool) -> CafeRecord {
        CafeRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            slug: id.to_string(),
            description: "A cafe with enough description to pass validation checks.".to_string(),
            city: city.to_string(),
            country: "Japan".to_string(),
            address: "1-1 Somewhere".to_string(),
            website: None,
            image: format!("/images/{id}.jpg"),
            tags: tags.iter().map(ToString::to_string).collect(),
            lat: None,
            lng: None,
            station: None,
            featured: featured.then_some(true),
            contributor: None,
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            cafe("a", "Kyoto", &["wifi"], false),
            cafe("b", "San Francisco", &["wifi", "quiet"], true),
            cafe("c", "Tokyo", &["outlets", "wifi"], true),
            cafe("d", "Tokyo", &["wifi", "late"], false),
            cafe("e", "Tokyo", &["quiet"], true),
        ])
    }

    #[test]
    fn summarizes_cities_by_count() {
        let cities = dataset().cities();
        let summary: Vec<(&str, &str, usize)> = cities
            .iter()
            .map(|c| (c.name.as_str(), c.slug.as_str(), c.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Tokyo", "tokyo", 3),
                ("Kyoto", "kyoto", 1),
                ("San Francisco", "san-francisco", 1),
            ]
        );
    }

    #[test]
    fn city_queries_use_slugs() {
        let data = dataset();
        assert_eq!(data.in_city("san-francisco").len(), 1);
        assert_eq!(data.city_tags("tokyo"), vec!["outlets", "wifi", "late", "quiet"]);
        assert!(data.in_city("osaka").is_empty());
    }

    #[test]
    fn featured_and_related_respect_limits() {
        let data = dataset();
        let featured: Vec<&str> = data.featured(2).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(featured, vec!["b", "c"]);

        let tokyo = data.find_by_slug("d").unwrap();
        let related: Vec<&str> = data.related(tokyo, 3).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(related, vec!["c", "e"]);
    }

    #[test]
    fn related_groups_cities_like_listings() {
        let data = Dataset::from_records(vec![
            cafe("a", "Paris", &["wifi"], false),
            cafe("b", "paris", &["quiet"], false),
            cafe("c", "Lyon", &["wifi"], false),
        ]);
        assert_eq!(data.cities()[0].count, 2);

        let first = data.find_by_id("a").unwrap();
        let related: Vec<&str> = data.related(first, 5).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(related, vec!["b"]);
    }

    #[test]
    fn load_and_refresh_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cafes.json");
        fs::write(&path, serde_json::to_string(&dataset().records).unwrap()).unwrap();

        let mut data = Dataset::load(&path).unwrap();
        assert_eq!(data.len(), 5);
        assert!(data.find_by_id("e").is_some());
        assert!(!data.is_stale(Duration::from_secs(3600)));

        fs::write(&path, "[]").unwrap();
        data.refresh().unwrap();
        assert!(data.is_empty());

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(data.refresh(), Err(DatasetError::Json { .. })));
        assert!(data.is_empty());
    }

    #[test]
    fn in_memory_datasets_cannot_refresh() {
        let mut data = dataset();
        assert!(matches!(data.refresh(), Err(DatasetError::NotBacked)));
        assert_eq!(data.len(), 5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let temp = tempdir().unwrap();
        assert!(matches!(
            Dataset::load(temp.path().join("missing.json")),
            Err(DatasetError::Io { .. })
        ));
    }
}
