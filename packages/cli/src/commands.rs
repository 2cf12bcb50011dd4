//! Implementations of the `cafeco` subcommands.
//!
//! Shared by the flag-driven entry point and the interactive menu.

use std::path::{Path, PathBuf};

use cafeco_build::enrich::Enricher;
use cafeco_build::{
    BuildError, BuildOptions, BuildReport, FileReport, FileStatus, ValidateOptions, run_build,
    run_validate,
};
use cafeco_cafe_models::directions_url;
use cafeco_cli_utils::{IndicatifProgress, MultiProgress};
use cafeco_content::paths;
use cafeco_content::submission::{Submission, scaffold_submission};
use cafeco_dataset::Dataset;
use cafeco_geocoder::{GeocodeError, GoogleGeocoder, service_registry};
use cafeco_search::{SearchConfig, SearchIndex};

use crate::{BuildArgs, ContentArgs};

/// Splits a comma-separated tag list, dropping blanks.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn content_root(args: &ContentArgs) -> PathBuf {
    args.content_dir.clone().unwrap_or_else(paths::content_dir)
}

fn asset_root(args: &ContentArgs) -> PathBuf {
    args.public_dir.clone().unwrap_or_else(paths::public_dir)
}

/// Path relative to the content root for display.
fn display_path<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

fn print_file(file: &FileReport, root: &Path) {
    let path = display_path(&file.path, root);
    match &file.status {
        FileStatus::Accepted { id } => {
            if file.geocoded {
                println!("  ok       {path} ({id}, geocoded)");
            } else {
                println!("  ok       {path} ({id})");
            }
        }
        FileStatus::Rejected(reason) => println!("  rejected {path}: {reason}"),
    }
    for warning in &file.warnings {
        println!("  warning  {path}: {warning}");
    }
}

fn print_report(report: &BuildReport, root: &Path) {
    for file in &report.files {
        print_file(file, root);
    }
    println!();
    println!("{}", report.counts);
}

/// Picks the geocoder for a build. A missing API key downgrades to a
/// per-record warning rather than failing the build.
fn make_enricher(args: &BuildArgs) -> Result<Enricher, GeocodeError> {
    if args.no_geocode {
        log::info!("Geocoding disabled");
        return Ok(Enricher::disabled());
    }

    let Some(service) = service_registry::default_service() else {
        log::warn!("No geocoding service enabled");
        return Ok(Enricher::without_credential());
    };

    match GoogleGeocoder::from_env(&service) {
        Ok(geocoder) => {
            let geocoder = match args.geocode_retries {
                Some(retries) => geocoder.with_max_retries(retries),
                None => geocoder,
            };
            log::info!("Geocoding with {}", service.name);
            Ok(Enricher::new(Box::new(geocoder)))
        }
        Err(GeocodeError::MissingApiKey { env }) => {
            log::warn!("{env} is not set; records without coordinates will not be geocoded");
            Ok(Enricher::without_credential())
        }
        Err(e) => Err(e),
    }
}

/// Runs a full build and prints per-file results.
///
/// # Errors
///
/// Returns an error if the content root cannot be read, an output cannot
/// be written, or strict mode rejected the build.
pub async fn build(args: &BuildArgs, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let options = BuildOptions {
        content_root: content_root(&args.content),
        outputs: if args.outputs.is_empty() {
            paths::default_outputs()
        } else {
            args.outputs.clone()
        },
        asset_root: Some(asset_root(&args.content)),
        strict: args.strict,
    };
    let enricher = make_enricher(args)?;

    println!("Building from {}", options.content_root.display());

    let progress = IndicatifProgress::files_bar(multi, "Building dataset");
    let result = run_build(&options, &enricher, progress).await;

    match result {
        Ok(report) => {
            print_report(&report, &options.content_root);
            for output in &report.outputs {
                println!("Wrote {}", output.display());
            }
            Ok(())
        }
        Err(BuildError::StrictModeRejections { rejected, report }) => {
            print_report(&report, &options.content_root);
            Err(BuildError::StrictModeRejections { rejected, report }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Validates every content file and prints errors and warnings.
///
/// # Errors
///
/// Returns an error if the content root cannot be read or any record has
/// errors. Warnings alone succeed.
pub fn validate(args: &ContentArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = ValidateOptions {
        content_root: content_root(args),
        asset_root: Some(asset_root(args)),
    };

    println!("Validating {}", options.content_root.display());

    let summary = run_validate(&options)?;
    for file in &summary.files {
        print_file(file, &options.content_root);
    }
    println!();
    println!("{}", summary.counts);

    if summary.has_errors() {
        return Err(format!("{} file(s) failed validation", summary.counts.rejected).into());
    }
    Ok(())
}

/// Searches the published dataset and prints ranked hits.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded or indexed.
pub fn search(
    query: &str,
    dataset: Option<PathBuf>,
    limit: usize,
    max_distance: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = Dataset::load(dataset.unwrap_or_else(paths::published_dataset_path))?;
    let config = SearchConfig {
        max_results: limit,
        max_edit_distance: max_distance,
        ..SearchConfig::default()
    };

    if query.trim().chars().count() < config.min_query_chars {
        println!(
            "Query must be at least {} characters",
            config.min_query_chars
        );
        return Ok(());
    }

    let index = SearchIndex::build(dataset.records(), config)?;
    let hits = index.search(query)?;

    if hits.is_empty() {
        println!("No cafes match \"{}\"", query.trim());
        return Ok(());
    }

    for (rank, hit) in hits.iter().enumerate() {
        let record = hit.record;
        println!(
            "{:>2}. {} ({}, {})  score {:.2}",
            rank + 1,
            record.name,
            record.city,
            record.country,
            hit.score
        );
        println!("    {}", record.address);
        println!("    {}", directions_url(record));
    }
    Ok(())
}

/// Prints every city with its cafe count.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded.
pub fn cities(dataset: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = Dataset::load(dataset.unwrap_or_else(paths::published_dataset_path))?;

    println!("{:<24} {:<24} {:<16} CAFES", "CITY", "SLUG", "COUNTRY");
    println!("{}", "-".repeat(72));
    for city in dataset.cities() {
        println!(
            "{:<24} {:<24} {:<16} {}",
            city.name, city.slug, city.country, city.count
        );
    }
    println!();
    println!("{} cafes", dataset.len());
    Ok(())
}

/// Writes a new content file for `submission`.
///
/// # Errors
///
/// Returns an error if the file exists already or cannot be written.
pub fn scaffold(
    submission: &Submission,
    content_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = content_dir.unwrap_or_else(paths::content_dir);
    let path = scaffold_submission(&root, submission)?;
    println!("Created {}", path.display());
    if submission.description.is_none() {
        println!("Add a description (50-500 characters) before running `cafeco validate`.");
    }
    Ok(())
}
