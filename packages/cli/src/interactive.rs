//! Menu-driven front end, shown when `cafeco` runs without a subcommand.

use dialoguer::{Confirm, Input, Select};

use cafeco_cli_utils::MultiProgress;
use cafeco_content::submission::Submission;

use crate::{BuildArgs, ContentArgs, commands};

enum Action {
    Build,
    Validate,
    Search,
    Cities,
    NewCafe,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Build,
        Self::Validate,
        Self::Search,
        Self::Cities,
        Self::NewCafe,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Build => "Build dataset",
            Self::Validate => "Validate content",
            Self::Search => "Search cafes",
            Self::Cities => "List cities",
            Self::NewCafe => "Add a new cafe",
        }
    }
}

fn optional(prompt: &str) -> Result<Option<String>, dialoguer::Error> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn required(prompt: &str) -> Result<String, dialoguer::Error> {
    Input::new().with_prompt(prompt).interact_text()
}

async fn build(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let geocode = Confirm::new()
        .with_prompt("Geocode records without coordinates?")
        .default(true)
        .interact()?;
    let strict = Confirm::new()
        .with_prompt("Strict mode (abort on any rejected record)?")
        .default(false)
        .interact()?;

    let args = BuildArgs {
        strict,
        no_geocode: !geocode,
        ..BuildArgs::default()
    };
    commands::build(&args, multi).await
}

fn search() -> Result<(), Box<dyn std::error::Error>> {
    let query = required("Search")?;
    commands::search(&query, None, 5, 1)
}

fn new_cafe() -> Result<(), Box<dyn std::error::Error>> {
    let submission = Submission {
        name: required("Name")?,
        city: required("City")?,
        country: required("Country")?,
        address: required("Address")?,
        slug: optional("Slug (blank to derive from name)")?,
        description: optional("Description")?,
        website: optional("Website")?,
        tags: optional("Tags (comma-separated)")?
            .as_deref()
            .map(commands::split_tags)
            .unwrap_or_default(),
        station: optional("Nearest station")?,
        contributor: optional("Your name")?,
    };
    commands::scaffold(&submission, None)
}

/// Prompts for an action and runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("cafeco");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Build => build(multi).await,
        Action::Validate => commands::validate(&ContentArgs::default()),
        Action::Search => search(),
        Action::Cities => commands::cities(None),
        Action::NewCafe => new_cafe(),
    }
}
