#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cafe record schema, field names, and ordering rules.
//!
//! This crate defines the canonical [`CafeRecord`] shared by every stage of
//! the cafeco toolchain: the content validator produces it, the builder
//! publishes it, and the dataset/search crates consume it. The published
//! dataset is a JSON array of these records sorted by `(city, name)` using
//! [`collation::compare`].

pub mod collation;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Required prefix for the `image` field of every record.
pub const IMAGE_PREFIX: &str = "/images/";

/// Maximum length of a cafe name, in characters.
pub const NAME_MAX_CHARS: usize = 100;

/// Minimum length of a cafe description, in characters.
pub const DESCRIPTION_MIN_CHARS: usize = 50;

/// Maximum length of a cafe description, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Legacy field name that older content files used instead of `address`.
pub const LEGACY_LOCATION_FIELD: &str = "location";

/// Every field the cafe schema knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum CafeField {
    /// Stable identifier, defaults to the slug.
    Id,
    /// Display name.
    Name,
    /// URL-safe identifier matching the content file name.
    Slug,
    /// Free-text description.
    Description,
    /// City the cafe is in.
    City,
    /// Country the cafe is in.
    Country,
    /// Street address, used as geocoding input.
    Address,
    /// Optional website URL.
    Website,
    /// Public image path.
    Image,
    /// Feature tags (wifi, outlets, quiet, ...).
    Tags,
    /// Latitude (WGS84).
    Lat,
    /// Longitude (WGS84).
    Lng,
    /// Nearest transit station.
    Station,
    /// Whether the cafe is highlighted on the landing page.
    Featured,
    /// Who submitted the cafe.
    Contributor,
}

impl CafeField {
    /// All schema fields, in published serialization order.
    pub const ALL: &[Self] = &[
        Self::Id,
        Self::Name,
        Self::Slug,
        Self::Description,
        Self::City,
        Self::Country,
        Self::Address,
        Self::Website,
        Self::Image,
        Self::Tags,
        Self::Lat,
        Self::Lng,
        Self::Station,
        Self::Featured,
        Self::Contributor,
    ];

    /// Fields that every content file must provide (after legacy
    /// normalization has filled in `id` and `address`).
    pub const REQUIRED: &[Self] = &[
        Self::Name,
        Self::Slug,
        Self::Description,
        Self::City,
        Self::Country,
        Self::Address,
        Self::Image,
        Self::Tags,
    ];

    /// Returns `true` if the raw key belongs to the schema, including the
    /// legacy `location` alias.
    #[must_use]
    pub fn is_known(key: &str) -> bool {
        key == LEGACY_LOCATION_FIELD || key.parse::<Self>().is_ok()
    }

    /// Returns `true` if the field must be present in every record.
    #[must_use]
    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude (WGS84), -90..=90.
    pub lat: f64,
    /// Longitude (WGS84), -180..=180.
    pub lng: f64,
}

impl Coordinates {
    /// Returns `true` if both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid_lat(self.lat) && is_valid_lng(self.lng)
    }
}

/// Returns `true` if `lat` is a finite latitude.
#[must_use]
pub fn is_valid_lat(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

/// Returns `true` if `lng` is a finite longitude.
#[must_use]
pub fn is_valid_lng(lng: f64) -> bool {
    lng.is_finite() && (-180.0..=180.0).contains(&lng)
}

/// Returns `true` if `slug` is non-empty lowercase alphanumerics and hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// A validated cafe record as published in the aggregated dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CafeRecord {
    /// Unique identifier within the dataset. Defaults to [`Self::slug`].
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL-safe identifier; equals the source file's base name.
    pub slug: String,
    /// Description shown on the detail page.
    pub description: String,
    /// City name (grouping key).
    pub city: String,
    /// Country name.
    pub country: String,
    /// Street address.
    pub address: String,
    /// Cafe website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Public image path, always starting with [`IMAGE_PREFIX`].
    pub image: String,
    /// Feature tags, never empty.
    pub tags: Vec<String>,
    /// Latitude, absent until geocoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude, absent until geocoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// Nearest transit station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    /// Landing-page highlight flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    /// Submitter credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,
}

impl CafeRecord {
    /// Returns the coordinates if both components are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }

    /// Returns `true` if the record lacks both coordinates and is eligible
    /// for geocoding. A record with only one component is left alone.
    #[must_use]
    pub const fn needs_geocoding(&self) -> bool {
        self.lat.is_none() && self.lng.is_none()
    }

    /// Sets both coordinate components.
    pub const fn set_coordinates(&mut self, coords: Coordinates) {
        self.lat = Some(coords.lat);
        self.lng = Some(coords.lng);
    }

    /// Returns `true` if the record is flagged as featured.
    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.featured.unwrap_or(false)
    }

    /// Returns the URL-safe slug of this record's city.
    #[must_use]
    pub fn city_slug(&self) -> String {
        city_slug(&self.city)
    }
}

/// Orders two records by `(city, name)` using locale-aware collation.
#[must_use]
pub fn compare_records(a: &CafeRecord, b: &CafeRecord) -> Ordering {
    collation::compare(&a.city, &b.city).then_with(|| collation::compare(&a.name, &b.name))
}

/// Sorts records into published dataset order. The sort is stable.
pub fn sort_records(records: &mut [CafeRecord]) {
    records.sort_by(compare_records);
}

/// Converts a city name into the slug used for city routes
/// (e.g., `"San Francisco"` → `"san-francisco"`).
#[must_use]
pub fn city_slug(city: &str) -> String {
    city.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Builds a Google Maps directions URL for the record.
///
/// Prefers coordinates and falls back to the street address.
#[must_use]
pub fn directions_url(record: &CafeRecord) -> String {
    const BASE: &str = "https://www.google.com/maps/dir/?api=1&destination=";

    record.coordinates().map_or_else(
        || {
            let encoded: String =
                url::form_urlencoded::byte_serialize(record.address.as_bytes()).collect();
            format!("{BASE}{encoded}")
        },
        |coords| format!("{BASE}{},{}", coords.lat, coords.lng),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, name: &str) -> CafeRecord {
        CafeRecord {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: "x".repeat(DESCRIPTION_MIN_CHARS),
            city: city.to_string(),
            country: "France".to_string(),
            address: "1 Rue de Rivoli, Paris".to_string(),
            website: None,
            image: format!("{IMAGE_PREFIX}paris/cafe.jpg"),
            tags: vec!["wifi".to_string()],
            lat: None,
            lng: None,
            station: None,
            featured: None,
            contributor: None,
        }
    }

    #[test]
    fn field_names_are_lowercase() {
        assert_eq!(CafeField::Lat.as_ref(), "lat");
        assert_eq!(CafeField::Contributor.to_string(), "contributor");
        assert_eq!("tags".parse::<CafeField>().unwrap(), CafeField::Tags);
    }

    #[test]
    fn legacy_location_is_known() {
        assert!(CafeField::is_known("location"));
        assert!(CafeField::is_known("slug"));
        assert!(!CafeField::is_known("googleMapsUrl"));
    }

    #[test]
    fn required_fields_exclude_optional_metadata() {
        assert!(CafeField::Name.is_required());
        assert!(!CafeField::Lat.is_required());
        assert!(!CafeField::Id.is_required());
    }

    #[test]
    fn validates_slugs() {
        assert!(is_valid_slug("cafe-a"));
        assert!(is_valid_slug("cafe-42"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Cafe-A"));
        assert!(!is_valid_slug("cafe_a"));
    }

    #[test]
    fn coordinate_ranges() {
        assert!(Coordinates { lat: 48.85, lng: 2.35 }.is_valid());
        assert!(!Coordinates { lat: 91.0, lng: 0.0 }.is_valid());
        assert!(!Coordinates { lat: 0.0, lng: -180.5 }.is_valid());
        assert!(!Coordinates { lat: f64::NAN, lng: 0.0 }.is_valid());
    }

    #[test]
    fn sorts_by_city_then_name() {
        let mut records = vec![
            record("Paris", "Zinc"),
            record("Berlin", "Oslo Kaffebar"),
            record("Paris", "Antoine"),
            record("amsterdam", "Lot Sixty One"),
        ];
        sort_records(&mut records);
        let order: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.city.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("amsterdam", "Lot Sixty One"),
                ("Berlin", "Oslo Kaffebar"),
                ("Paris", "Antoine"),
                ("Paris", "Zinc"),
            ]
        );
    }

    #[test]
    fn geocoding_requires_both_components_missing() {
        let mut cafe = record("Paris", "Antoine");
        assert!(cafe.needs_geocoding());
        cafe.lat = Some(48.86);
        assert!(!cafe.needs_geocoding());
        assert!(cafe.coordinates().is_none());
    }

    #[test]
    fn city_slug_replaces_every_space() {
        assert_eq!(city_slug("San Francisco"), "san-francisco");
        assert_eq!(city_slug("  Rio de  Janeiro "), "rio-de-janeiro");
    }

    #[test]
    fn directions_prefer_coordinates() {
        let mut cafe = record("Paris", "Antoine");
        assert_eq!(
            directions_url(&cafe),
            "https://www.google.com/maps/dir/?api=1&destination=1+Rue+de+Rivoli%2C+Paris"
        );
        cafe.set_coordinates(Coordinates {
            lat: 48.86,
            lng: 2.34,
        });
        assert_eq!(
            directions_url(&cafe),
            "https://www.google.com/maps/dir/?api=1&destination=48.86,2.34"
        );
    }

    #[test]
    fn serializes_without_absent_optionals() {
        let cafe = record("Paris", "Antoine");
        let value = serde_json::to_value(&cafe).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("lat"));
        assert!(!obj.contains_key("website"));
        assert_eq!(obj["id"], "antoine");
    }
}
