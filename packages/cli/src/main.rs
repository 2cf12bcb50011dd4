#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `cafeco`: builds, validates, and searches the cafe directory.
//!
//! Without a subcommand an interactive menu is shown. Log output goes
//! through [`cafeco_cli_utils::init_logger`] so it never tears progress
//! bars; set `RUST_LOG=info` for per-file log lines.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cafeco", about = "Cafe directory data pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Content locations shared by `build` and `validate`.
#[derive(Args, Clone, Debug, Default)]
pub struct ContentArgs {
    /// Content root holding one JSON file per cafe (default: `data/cafes`,
    /// or `CAFECO_CONTENT_DIR`)
    #[arg(long)]
    pub content_dir: Option<PathBuf>,
    /// Public asset directory used to check that images exist
    /// (default: `public`)
    #[arg(long)]
    pub public_dir: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub content: ContentArgs,
    /// Write the dataset here. Repeat for several outputs (default:
    /// `public/cafes.json` and `src/data/cafes.json`)
    #[arg(long = "output")]
    pub outputs: Vec<PathBuf>,
    /// Fail without writing anything if any record is rejected
    #[arg(long, env = "CAFECO_STRICT", value_parser = clap::builder::BoolishValueParser::new())]
    pub strict: bool,
    /// Skip geocoding entirely
    #[arg(long)]
    pub no_geocode: bool,
    /// Retries per address on transient geocoding failures
    #[arg(long)]
    pub geocode_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, geocode, and publish the dataset
    Build(BuildArgs),
    /// Check every content file without writing anything
    Validate(ContentArgs),
    /// Fuzzy search the published dataset
    Search {
        /// Text to search for (at least 3 characters)
        query: String,
        /// Published dataset to search (default: `public/cafes.json`)
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Maximum number of results
        #[arg(long, default_value = "5")]
        limit: usize,
        /// Maximum edit distance for fuzzy matches (0-2)
        #[arg(long, default_value = "1")]
        max_distance: u8,
    },
    /// List cities in the published dataset
    Cities {
        /// Published dataset to read (default: `public/cafes.json`)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
    /// Scaffold a content file for a new cafe
    New {
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        address: String,
        /// Defaults to a slug derived from the name
        #[arg(long)]
        slug: Option<String>,
        /// Comma-separated tags (e.g., "wifi,outlets")
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        website: Option<String>,
        /// Nearest transit station
        #[arg(long)]
        station: Option<String>,
        #[arg(long)]
        contributor: Option<String>,
        /// Content root to write into
        #[arg(long)]
        content_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = cafeco_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Build(args) => commands::build(&args, &multi).await?,
        Commands::Validate(args) => commands::validate(&args)?,
        Commands::Search {
            query,
            dataset,
            limit,
            max_distance,
        } => commands::search(&query, dataset, limit, max_distance)?,
        Commands::Cities { dataset } => commands::cities(dataset)?,
        Commands::New {
            name,
            city,
            country,
            address,
            slug,
            tags,
            description,
            website,
            station,
            contributor,
            content_dir,
        } => {
            let submission = cafeco_content::submission::Submission {
                name,
                city,
                country,
                address,
                slug,
                description,
                website,
                tags: tags.as_deref().map(commands::split_tags).unwrap_or_default(),
                station,
                contributor,
            };
            commands::scaffold(&submission, content_dir)?;
        }
    }

    Ok(())
}
