// ABOUTME: Foodgram CLI - catalog management for the recipe API
// ABOUTME: Loads tags and ingredients from JSON files and creates single tags
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors
//!
//! Usage:
//! ```bash
//! # Load the ingredient catalog
//! foodgram-cli load-ingredients --path data/ingredients.json
//!
//! # Load tags
//! foodgram-cli load-tags --path data/tags.json
//!
//! # Create one tag
//! foodgram-cli create-tag --name Breakfast --slug breakfast
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use foodgram_server::{
    catalog_import,
    config::environment::DEFAULT_DATABASE_URL,
    database::{Database, ImportReport},
    errors::AppError,
    logging::LoggingConfig,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "foodgram-cli",
    about = "Foodgram catalog management CLI",
    long_about = "Command-line tool for loading the tag and ingredient catalogs of the Foodgram API."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Load ingredients from a JSON file of `{name, measurement_unit}` objects
    LoadIngredients {
        /// Source file
        #[arg(long, default_value = "data/ingredients.json")]
        path: PathBuf,
    },

    /// Load tags from a JSON file of `{name, slug}` objects
    LoadTags {
        /// Source file
        #[arg(long, default_value = "data/tags.json")]
        path: PathBuf,
    },

    /// Create a single tag
    CreateTag {
        /// Display name
        #[arg(long)]
        name: String,

        /// URL-safe identifier
        #[arg(long)]
        slug: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    LoggingConfig::for_cli(cli.verbose).init()?;

    let database_url = cli
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

    info!("Connecting to database: {database_url}");
    let database = Database::new(&database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;

    match cli.command {
        Command::LoadIngredients { path } => {
            let report = catalog_import::load_ingredients_file(&database, &path)
                .await
                .map_err(with_field_details)
                .with_context(|| format!("Failed to load ingredients from {}", path.display()))?;
            print_report("ingredients", &report);
        }
        Command::LoadTags { path } => {
            let report = catalog_import::load_tags_file(&database, &path)
                .await
                .map_err(with_field_details)
                .with_context(|| format!("Failed to load tags from {}", path.display()))?;
            print_report("tags", &report);
        }
        Command::CreateTag { name, slug } => {
            let tag = catalog_import::create_tag(&database, &name, &slug)
                .await
                .map_err(with_field_details)
                .context("Failed to create tag")?;
            println!("Created tag {} ({}) with id {}", tag.name, tag.slug, tag.id);
        }
    }

    Ok(())
}

/// Fold per-field validation messages into the error text
fn with_field_details(err: AppError) -> anyhow::Error {
    if err.field_errors.is_empty() {
        return err.into();
    }
    let details = err
        .field_errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ");
    anyhow!("{err} ({details})")
}

fn print_report(kind: &str, report: &ImportReport) {
    println!("Loaded {} {kind}", report.added);
    if !report.skipped.is_empty() {
        println!("Skipped {} existing {kind}:", report.skipped.len());
        for label in &report.skipped {
            println!("  - {label}");
        }
    }
}
