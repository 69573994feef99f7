//! Zeladoria CLI - report city problems to the Maricá zeladoria service.
//!
//! Wraps the report form (location capture + submission), the report list,
//! and the offline asset cache in a small set of subcommands.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zeladoria_core::api::ApiClient;
use zeladoria_core::location::{FixedLocator, Locator, UnsupportedLocator};
use zeladoria_core::models::{Category, CategoryId, Photo, ReportDraft, SubmissionStatus};
use zeladoria_core::offline::{CacheStorage, CacheWorker, HttpFetcher, ResponseSource};
use zeladoria_core::utils::{format_coordinate, format_date, truncate_string};
use zeladoria_core::{Config, ReportForm};

// ============================================================================
// Constants
// ============================================================================

/// Subdirectory of the cache dir holding the asset caches
const ASSET_CACHE_DIR: &str = "assets";

/// Maximum description length shown in the report list
const LIST_DESCRIPTION_WIDTH: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "zeladoria")]
#[command(version, about = "Report city problems to the Maricá zeladoria service")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the problem categories
    Categories,

    /// Send a new report
    Submit {
        /// Category id (see `categories`)
        #[arg(short, long)]
        category: Option<CategoryId>,

        /// What is wrong and where
        #[arg(short, long)]
        description: String,

        /// Photo of the problem
        #[arg(short, long)]
        photo: PathBuf,

        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
    },

    /// List submitted reports and their status
    List,

    /// Download the app's static assets for offline use
    Install,

    /// Fetch a URL through the offline cache
    Fetch {
        /// Path (relative to the asset origin) or absolute URL
        url: String,

        /// Write the body here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the offline caches and what they hold
    Status,

    /// Show or change the configuration
    Config {
        #[arg(long)]
        api_url: Option<String>,

        #[arg(long)]
        asset_origin: Option<String>,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let args = Args::parse();
    // A broken config file must not block `config`, which is how it gets fixed
    let mut config = Config::load_or_default();

    match args.command {
        Command::Categories => list_categories(),
        Command::Submit {
            category,
            description,
            photo,
            lat,
            lng,
        } => {
            let location = lat.zip(lng);
            let status = submit_report(&mut config, category, description, photo, location).await?;
            if status.is_error() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::List => list_reports(&config).await,
        Command::Install => install_assets(&config).await,
        Command::Fetch { url, output } => fetch_asset(&config, &url, output).await,
        Command::Status => show_cache_status(&config),
        Command::Config {
            api_url,
            asset_origin,
        } => update_config(&mut config, api_url, asset_origin),
    }
}

fn list_categories() -> Result<()> {
    for category in Category::ALL {
        println!("{}  {}", category.id(), category.label());
    }
    Ok(())
}

async fn submit_report(
    config: &mut Config,
    category: Option<CategoryId>,
    description: String,
    photo: PathBuf,
    location: Option<(f64, f64)>,
) -> Result<SubmissionStatus> {
    let category = category
        .or(config.default_category)
        .ok_or_else(|| anyhow::anyhow!("No category given. Use --category (see `zeladoria categories`)"))?;
    if Category::from_id(category).is_none() {
        eprintln!("Warning: category {} is not one of the known categories", category);
    }

    let form = ReportForm::new(ReportDraft::new(category, description));
    form.set_photo(Some(Photo::from_path(&photo)?)).await;

    let locator: Box<dyn Locator> = match location {
        Some((lat, lng)) => Box::new(FixedLocator::new(lat, lng)),
        None => Box::new(UnsupportedLocator),
    };
    eprintln!("{}", SubmissionStatus::CapturingLocation);
    let status = form.capture_location(locator.as_ref()).await;
    eprintln!("{}", status);
    if let Some(coordinate) = form.draft().await.coordinate {
        eprintln!("GPS: {}", format_coordinate(&coordinate));
    }

    let client = ApiClient::new(config.api_base_url())?;
    info!(url = %client.reports_url(), category, "Submitting report");
    eprintln!("{}", SubmissionStatus::Submitting);
    let status = form.submit(&client).await;
    println!("{}", status);

    if status == SubmissionStatus::Success && config.default_category != Some(category) {
        config.default_category = Some(category);
        if let Err(e) = config.save() {
            warn!(error = %e, "Failed to save default category");
        }
    }
    Ok(status)
}

async fn list_reports(config: &Config) -> Result<()> {
    let client = ApiClient::new(config.api_base_url())?;
    let reports = client.fetch_reports().await?;

    if reports.is_empty() {
        println!("No reports yet.");
        return Ok(());
    }

    for report in &reports {
        let category = report
            .category_name
            .clone()
            .or_else(|| Category::from_id(report.category).map(|c| c.label().to_string()))
            .unwrap_or_else(|| format!("Categoria {}", report.category));
        println!(
            "#{:<5} {:<24} {:<18} {}  {}",
            report.id,
            report.state_label(),
            category,
            format_date(&report.created_at),
            truncate_string(&report.description, LIST_DESCRIPTION_WIDTH),
        );
        if let Some(note) = report.latest_note() {
            println!("       └ {}", note);
        }
    }
    Ok(())
}

fn asset_worker(config: &Config) -> Result<CacheWorker<HttpFetcher>> {
    let storage = CacheStorage::new(config.cache_dir()?.join(ASSET_CACHE_DIR))?;
    let worker = CacheWorker::new(config.asset_origin(), storage, HttpFetcher::new()?)?;
    Ok(worker)
}

async fn install_assets(config: &Config) -> Result<()> {
    let mut worker = asset_worker(config)?;
    let report = worker
        .install()
        .await
        .context("Failed to install offline assets")?;

    println!("Cached {} assets in {}", report.cached, report.cache_name);
    for name in &report.evicted {
        println!("Removed old cache {}", name);
    }
    Ok(())
}

async fn fetch_asset(config: &Config, url: &str, output: Option<PathBuf>) -> Result<()> {
    let worker = asset_worker(config)?;
    let served = worker.handle_fetch(url).await?;

    let source = match served.source {
        ResponseSource::Cache => "cache",
        ResponseSource::Network => "network",
    };
    eprintln!("{} {} (from {})", served.response.status, served.response.url, source);

    match output {
        Some(path) => std::fs::write(&path, &served.response.body)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout().write_all(&served.response.body)?,
    }
    Ok(())
}

fn show_cache_status(config: &Config) -> Result<()> {
    let worker = asset_worker(config)?;
    let storage = worker.storage();
    let names = storage.keys()?;
    if names.is_empty() {
        println!("No offline caches. Run `zeladoria install`.");
        return Ok(());
    }

    for name in names {
        println!("{}", name);
        if let Some(cache) = storage.existing(&name)? {
            for (url, age) in cache.entries()? {
                println!("  {}  ({})", url, age);
            }
        }
    }
    Ok(())
}

fn update_config(config: &mut Config, api_url: Option<String>, asset_origin: Option<String>) -> Result<()> {
    let changed = api_url.is_some() || asset_origin.is_some();
    if let Some(url) = api_url {
        config.api_base_url = Some(url);
    }
    if let Some(origin) = asset_origin {
        config.asset_origin = Some(origin);
    }
    if changed {
        config.save()?;
    }

    println!("Config file:   {}", Config::config_path()?.display());
    println!("API URL:       {}", config.api_base_url());
    println!("Asset origin:  {}", config.asset_origin());
    if let Some(category) = config.default_category {
        println!("Last category: {}", category);
    }
    Ok(())
}
