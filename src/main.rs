// src/main.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use rigsmith::application::commands::*;
use rigsmith::application::{ErrorResponse, SaveBuildDto};
use rigsmith::config::AppConfig;
use rigsmith::domain::{BuildId, PartCategory};
use rigsmith::events::EventBus;
use rigsmith::integrations::{CatalogGateway, HttpCatalogGateway};
use rigsmith::AppState;

#[derive(Parser, Debug)]
#[command(name = "rigsmith")]
#[command(about = "Assemble, check and save PC builds against the parts catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Print a saved build with its compatibility checks
    Show { build_id: BuildId },
    /// List saved builds with their part prices
    Builds,
    /// One page of a category
    Browse {
        category: String,
        #[arg(default_value_t = 1)]
        page: u32,
    },
    /// Search a category by keyword and display-currency price
    Search {
        category: String,
        term: String,
        min_price: Option<f64>,
        max_price: Option<f64>,
    },
    /// Parts of a category fitting the rest of a saved build
    Compatible { category: String, build_id: BuildId },
    /// Create a build, or update the one given with --build
    Save {
        name: String,
        /// Existing build to update
        #[arg(long)]
        build: Option<BuildId>,
        /// Parts as <category>=<id>, e.g. cpu=3 gpu=7
        #[arg(value_parser = parse_part)]
        parts: Vec<(PartCategory, i64)>,
    },
    /// Delete a saved build
    Delete { build_id: BuildId },
}

fn parse_part(raw: &str) -> Result<(PartCategory, i64), String> {
    let (category, id) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <category>=<id>, got `{}`", raw))?;
    let category = PartCategory::parse(category).map_err(|e| e.to_string())?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("part id must be a number, got `{}`", id))?;
    Ok((category, id))
}

fn save_request(name: String, build: Option<BuildId>, parts: Vec<(PartCategory, i64)>) -> SaveBuildDto {
    SaveBuildDto {
        build_id: build,
        build_name: name,
        parts: parts
            .into_iter()
            .map(|(category, id)| (category.key().to_string(), id))
            .collect(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // 1. CONFIGURATION
    let config = AppConfig::load().context("failed to load configuration")?;

    // 2. INFRASTRUCTURE
    let gateway: Arc<dyn CatalogGateway> = Arc::new(
        HttpCatalogGateway::new(config.catalog.base_url.clone(), config.catalog.timeout())
            .context("failed to create the catalog client")?,
    );
    let event_bus = Arc::new(EventBus::new());
    info!("Catalog at {}", config.catalog.base_url);

    // 3. APPLICATION STATE
    let state = AppState::new(config, gateway, event_bus);

    // 4. DISPATCH
    match cli.command {
        Commands::Show { build_id } => print(show_build(&state, build_id).await),
        Commands::Builds => print(list_saved_builds(&state).await),
        Commands::Browse { category, page } => print(browse_parts(&state, &category, page).await),
        Commands::Search {
            category,
            term,
            min_price,
            max_price,
        } => print(search_parts(&state, &category, &term, min_price, max_price).await),
        Commands::Compatible { category, build_id } => {
            print(compatible_parts(&state, &category, build_id).await)
        }
        Commands::Save { name, build, parts } => {
            print(save_build(&state, save_request(name, build, parts)).await)
        }
        Commands::Delete { build_id } => print(delete_build(&state, build_id).await),
    }
}

/// Print the DTO as JSON, or the error response and fail
fn print<T: Serialize>(result: Result<T, ErrorResponse>) -> Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(response) => {
            eprintln!("{}", serde_json::to_string_pretty(&response)?);
            std::process::exit(1);
        }
    }
}
