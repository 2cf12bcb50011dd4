use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cafeco_build::enrich::{EnrichWarning, Enricher};
use cafeco_build::progress::null_progress;
use cafeco_build::{
    BuildError, BuildOptions, BuildWarning, FileStatus, RejectReason, ValidateOptions, run_build,
    run_validate,
};
use cafeco_cafe_models::{CafeRecord, Coordinates, collation};
use cafeco_content::ContentError;
use cafeco_geocoder::{GeocodeError, Geocoder};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

const PARIS: Coordinates = Coordinates {
    lat: 48.8566,
    lng: 2.3522,
};

struct CountingGeocoder {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Geocoder for CountingGeocoder {
    fn name(&self) -> &str {
        "counting"
    }

    async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(PARIS))
    }
}

struct DownGeocoder;

#[async_trait::async_trait]
impl Geocoder for DownGeocoder {
    fn name(&self) -> &str {
        "down"
    }

    async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        Err(GeocodeError::Upstream {
            status: "UNKNOWN_ERROR".to_string(),
            message: "try again".to_string(),
        })
    }
}

struct Site {
    _temp: TempDir,
    content: PathBuf,
    outputs: Vec<PathBuf>,
}

impl Site {
    fn new() -> Self {
        let temp = tempdir().unwrap();
        let content = temp.path().join("data/cafes");
        fs::create_dir_all(&content).unwrap();
        let outputs = vec![
            temp.path().join("public/cafes.json"),
            temp.path().join("src/data/cafes.json"),
        ];
        Self {
            _temp: temp,
            content,
            outputs,
        }
    }

    fn write(&self, relative: &str, value: &Value) -> PathBuf {
        let path = self.content.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    fn write_text(&self, relative: &str, text: &str) {
        let path = self.content.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn options(&self) -> BuildOptions {
        BuildOptions {
            content_root: self.content.clone(),
            outputs: self.outputs.clone(),
            asset_root: None,
            strict: false,
        }
    }

    fn published(&self) -> Vec<Value> {
        let text = fs::read_to_string(&self.outputs[0]).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

fn cafe(slug: &str, name: &str, city: &str) -> Value {
    json!({
        "name": name,
        "slug": slug,
        "description": "Quiet tables, strong coffee, plenty of outlets and a reliable connection.",
        "city": city,
        "country": "France",
        "address": format!("{name}, {city}"),
        "image": format!("/images/{slug}.jpg"),
        "tags": ["wifi", "outlets"]
    })
}

fn counting() -> (Enricher, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let enricher = Enricher::new(Box::new(CountingGeocoder {
        calls: Arc::clone(&calls),
    }));
    (enricher, calls)
}

#[tokio::test]
async fn paris_scenario_with_credential() {
    let site = Site::new();
    let cafe_a = site.write("paris/cafe-a.json", &cafe("cafe-a", "Cafe A", "Paris"));
    site.write("paris/cafe-b.json", &cafe("wrong-slug", "Cafe B", "Paris"));
    let (enricher, calls) = counting();

    let report = run_build(&site.options(), &enricher, null_progress())
        .await
        .unwrap();

    assert_eq!(report.counts.discovered, 2);
    assert_eq!(report.counts.accepted, 1);
    assert_eq!(report.counts.rejected, 1);
    assert_eq!(report.counts.geocoded, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let rejections: Vec<(&Path, &RejectReason)> = report.rejections().collect();
    assert_eq!(rejections.len(), 1);
    assert!(rejections[0].0.ends_with("paris/cafe-b.json"));
    assert!(rejections[0].1.to_string().contains("slug mismatch"));

    let published = site.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["slug"], "cafe-a");
    assert_eq!(published[0]["lat"], json!(PARIS.lat));

    let source: Value = serde_json::from_str(&fs::read_to_string(cafe_a).unwrap()).unwrap();
    assert_eq!(source["lng"], json!(PARIS.lng));
}

#[tokio::test]
async fn paris_scenario_without_credential() {
    let site = Site::new();
    site.write("paris/cafe-a.json", &cafe("cafe-a", "Cafe A", "Paris"));
    site.write("paris/cafe-b.json", &cafe("wrong-slug", "Cafe B", "Paris"));

    let report = run_build(&site.options(), &Enricher::without_credential(), null_progress())
        .await
        .unwrap();

    let accepted = &report.files[0];
    assert!(accepted.is_accepted());
    assert_eq!(
        accepted.warnings,
        vec![BuildWarning::Enrichment(EnrichWarning::NoCredential)]
    );

    let published = site.published();
    assert_eq!(published.len(), 1);
    assert!(published[0].get("lat").is_none());
    assert!(published[0].get("lng").is_none());
}

#[tokio::test]
async fn enrichment_is_idempotent_across_builds() {
    let site = Site::new();
    site.write("paris/cafe-a.json", &cafe("cafe-a", "Cafe A", "Paris"));
    let (enricher, calls) = counting();

    let first = run_build(&site.options(), &enricher, null_progress())
        .await
        .unwrap();
    let second = run_build(&site.options(), &enricher, null_progress())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.counts.geocoded, 1);
    assert_eq!(second.counts.geocoded, 0);
    assert_eq!(first.records, second.records);
}

#[tokio::test]
async fn geocoder_failure_is_soft() {
    let site = Site::new();
    site.write("lyon/cafe-a.json", &cafe("cafe-a", "Cafe A", "Lyon"));

    let report = run_build(
        &site.options(),
        &Enricher::new(Box::new(DownGeocoder)),
        null_progress(),
    )
    .await
    .unwrap();

    assert_eq!(report.counts.accepted, 1);
    assert!(matches!(
        report.files[0].warnings[..],
        [BuildWarning::Enrichment(EnrichWarning::Failed { .. })]
    ));
    assert!(site.published()[0].get("lat").is_none());
}

#[tokio::test]
async fn round_trip_preserves_every_field() {
    let site = Site::new();
    let mut sources = vec![
        cafe("cafe-a", "Cafe A", "Berlin"),
        cafe("cafe-b", "Cafe B", "Lisbon"),
        cafe("cafe-c", "Cafe C", "Tokyo"),
    ];
    sources[0]["website"] = json!("https://cafe-a.example");
    sources[1]["lat"] = json!(38.72);
    sources[1]["lng"] = json!(-9.14);
    sources[2]["station"] = json!("Shibuya");
    sources[2]["featured"] = json!(true);
    sources[2]["contributor"] = json!("kenji");
    sources[2]["id"] = json!("tokyo-cafe-c");

    for source in &sources {
        let slug = source["slug"].as_str().unwrap();
        site.write(&format!("{slug}.json"), source);
    }

    let report = run_build(&site.options(), &Enricher::disabled(), null_progress())
        .await
        .unwrap();
    assert_eq!(report.counts.accepted, sources.len());
    assert_eq!(report.counts.warnings, 0);

    let published = site.published();
    assert_eq!(published.len(), sources.len());
    for (source, record) in sources.iter_mut().zip(&published) {
        if source.get("id").is_none() {
            source["id"] = source["slug"].clone();
        }
        assert_eq!(record, source);
    }
}

#[tokio::test]
async fn output_is_sorted_by_city_then_name() {
    let site = Site::new();
    site.write("a.json", &cafe("a", "Zinc", "paris"));
    site.write("b.json", &cafe("b", "Atelier", "Paris"));
    site.write("c.json", &cafe("c", "Brew", "Berlin"));
    site.write("d.json", &cafe("d", "alpha", "Paris"));
    site.write("e.json", &cafe("e", "Kaffee", "amsterdam"));

    let report = run_build(&site.options(), &Enricher::disabled(), null_progress())
        .await
        .unwrap();

    let records: Vec<CafeRecord> =
        serde_json::from_str(&fs::read_to_string(&site.outputs[0]).unwrap()).unwrap();
    assert_eq!(records, report.records);

    for pair in records.windows(2) {
        let city = collation::compare(&pair[0].city, &pair[1].city);
        assert!(city.is_le());
        if city.is_eq() {
            assert!(collation::compare(&pair[0].name, &pair[1].name).is_le());
        }
    }
    let cities: Vec<&str> = records.iter().map(|r| r.city.as_str()).collect();
    assert_eq!(cities, vec!["amsterdam", "Berlin", "paris", "Paris", "Paris"]);
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let site = Site::new();
    let mut first = cafe("cafe-a", "Cafe A", "Paris");
    first["id"] = json!("shared");
    let mut second = cafe("cafe-b", "Cafe B", "Paris");
    second["id"] = json!("shared");
    site.write("paris/cafe-a.json", &first);
    site.write("paris/cafe-b.json", &second);

    let report = run_build(&site.options(), &Enricher::disabled(), null_progress())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].slug, "cafe-a");
    assert!(matches!(
        report.files[1].status,
        FileStatus::Rejected(RejectReason::DuplicateId { ref id, .. }) if id == "shared"
    ));
}

#[tokio::test]
async fn rejected_records_never_publish() {
    let site = Site::new();
    let mut missing_tags = cafe("cafe-a", "Cafe A", "Paris");
    missing_tags.as_object_mut().unwrap().remove("tags");
    site.write("paris/cafe-a.json", &missing_tags);
    site.write("paris/cafe-b.json", &cafe("cafe-b", "Cafe B", "Paris"));

    let report = run_build(&site.options(), &Enricher::disabled(), null_progress())
        .await
        .unwrap();

    let slugs: Vec<&str> = report.records.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, vec!["cafe-b"]);
    assert_eq!(site.published().len(), 1);
}

#[tokio::test]
async fn malformed_files_are_per_record_rejections() {
    let site = Site::new();
    site.write_text("paris/broken.json", "{\"name\": ");
    site.write_text("paris/list.json", "[]");
    site.write("paris/cafe-a.json", &cafe("cafe-a", "Cafe A", "Paris"));

    let report = run_build(&site.options(), &Enricher::disabled(), null_progress())
        .await
        .unwrap();

    assert_eq!(report.counts.rejected, 2);
    assert_eq!(report.counts.accepted, 1);
    assert!(
        report
            .rejections()
            .all(|(_, reason)| matches!(reason, RejectReason::Malformed { .. }))
    );
}

#[tokio::test]
async fn strict_mode_fails_without_writing() {
    let site = Site::new();
    site.write("paris/cafe-a.json", &cafe("cafe-a", "Cafe A", "Paris"));
    site.write("paris/cafe-b.json", &cafe("wrong-slug", "Cafe B", "Paris"));
    let options = BuildOptions {
        strict: true,
        ..site.options()
    };

    let err = run_build(&options, &Enricher::disabled(), null_progress())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::StrictModeRejections { rejected: 1, .. }
    ));
    assert!(site.outputs.iter().all(|output| !output.exists()));
}

#[tokio::test]
async fn missing_root_is_fatal() {
    let site = Site::new();
    let options = BuildOptions {
        content_root: site.content.join("nope"),
        ..site.options()
    };
    let err = run_build(&options, &Enricher::disabled(), null_progress())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::Content(ContentError::RootNotFound(_))
    ));
}

#[tokio::test]
async fn writes_identical_outputs() {
    let site = Site::new();
    site.write("paris/cafe-a.json", &cafe("cafe-a", "Cafe A", "Paris"));

    let report = run_build(&site.options(), &Enricher::disabled(), null_progress())
        .await
        .unwrap();

    assert_eq!(report.outputs, site.outputs);
    let published = fs::read_to_string(&site.outputs[0]).unwrap();
    let mirror = fs::read_to_string(&site.outputs[1]).unwrap();
    assert_eq!(published, mirror);
    assert!(published.starts_with("[\n  {\n    \"id\": \"cafe-a\","));
    assert!(published.ends_with("]\n"));
}

#[tokio::test]
async fn legacy_location_and_missing_id_are_normalized() {
    let site = Site::new();
    let mut legacy = cafe("cafe-a", "Cafe A", "Paris");
    let address = legacy["address"].clone();
    let object = legacy.as_object_mut().unwrap();
    object.remove("address");
    object.insert("location".to_string(), address.clone());
    site.write("paris/cafe-a.json", &legacy);

    let report = run_build(&site.options(), &Enricher::disabled(), null_progress())
        .await
        .unwrap();

    assert_eq!(report.records[0].id, "cafe-a");
    assert_eq!(report.records[0].address, address.as_str().unwrap());
    assert_eq!(report.counts.warnings, 0);
}

#[tokio::test]
async fn enrichment_writes_back_only_coordinates() {
    let site = Site::new();
    let legacy = json!({
        "name": "Cafe A",
        "slug": "cafe-a",
        "description": "Quiet tables, strong coffee, plenty of outlets and a reliable connection.",
        "city": "Paris",
        "country": "France",
        "location": "Cafe A, Paris",
        "image": "/images/cafe-a.jpg",
        "tags": ["wifi", "outlets"]
    });
    let path = site.write("paris/cafe-a.json", &legacy);
    let (enricher, calls) = counting();

    let report = run_build(&site.options(), &enricher, null_progress())
        .await
        .unwrap();
    assert_eq!(report.counts.geocoded, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let source: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let keys: Vec<&str> = source
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec![
            "name",
            "slug",
            "description",
            "city",
            "country",
            "location",
            "image",
            "tags",
            "lat",
            "lng"
        ]
    );
    assert_eq!(source["lat"], json!(PARIS.lat));

    // The published record is still normalized.
    assert_eq!(site.published()[0]["id"], "cafe-a");
    assert_eq!(site.published()[0]["address"], "Cafe A, Paris");
}

#[test]
fn validate_reports_errors_and_warnings() {
    let site = Site::new();
    let mut unknown = cafe("cafe-a", "Cafe A", "Paris");
    unknown["googleMapsUrl"] = json!("https://maps.example");
    site.write("paris/cafe-a.json", &unknown);

    let summary = run_validate(&ValidateOptions {
        content_root: site.content.clone(),
        asset_root: None,
    })
    .unwrap();
    assert!(!summary.has_errors());
    assert_eq!(summary.counts.warnings, 1);

    site.write("paris/cafe-b.json", &cafe("wrong-slug", "Cafe B", "Paris"));
    let summary = run_validate(&ValidateOptions {
        content_root: site.content.clone(),
        asset_root: None,
    })
    .unwrap();
    assert!(summary.has_errors());
    assert_eq!(summary.counts.rejected, 1);
    assert!(site.outputs.iter().all(|output| !output.exists()));
}
