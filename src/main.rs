//! # News Feed
//!
//! Scrapes news listing pages and publishes the discovered articles as an
//! RSS 2.0 feed, meant to be run on a schedule and served as a static file.
//!
//! ## Features
//!
//! - Built-in scraper for the FIT@HCMUS announcement categories
//! - Selector-driven scraper for other sites, configured in YAML
//! - Per-item validation with a skip-or-fail policy
//! - Merging of several sources into one newest-first feed, with per-source
//!   failure isolation
//! - Atomic replacement of the output file
//!
//! ## Usage
//!
//! ```sh
//! news_feed -o public/feed.xml
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: GET each configured listing page
//! 2. **Extraction**: site-specific extractor turns HTML into candidates
//! 3. **Validation**: candidates become `NewsItem`s or are rejected
//! 4. **Output**: items are sorted, serialized and written to the feed file

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod config;
mod errors;
mod fetch;
mod models;
mod outputs;
mod scrapers;
mod utils;
mod validate;

use cli::Cli;
use config::{Mode, Settings};
use errors::FeedError;
use fetch::build_client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut settings = Settings::load(args.config.as_deref()).await?;
    settings.apply_cli(&args);
    settings.validate()?;
    info!(
        mode = ?settings.mode,
        sources = settings.sources.len(),
        output = %settings.output.display(),
        "Settings resolved"
    );

    let published = match run(&settings).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Feed update failed; previous feed left untouched");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        items = published,
        path = %settings.output.display(),
        "Execution complete"
    );
    Ok(())
}

/// Scrape the configured sources and write the feed.
///
/// Returns the number of items published. The output file is only touched
/// once the whole document has been built.
#[instrument(level = "info", skip_all, fields(mode = ?settings.mode))]
async fn run(settings: &Settings) -> Result<usize, FeedError> {
    let client = build_client(settings.timeout())?;

    match settings.mode {
        Mode::Single => {
            let scraper = settings
                .build_scrapers(&client)?
                .into_iter()
                .next()
                .ok_or_else(|| FeedError::config("no source configured"))?;
            let items = scraper.collect().await?;
            let count = items.len();
            scraper.build_feed(items, &settings.output).await?;
            Ok(count)
        }
        Mode::Merged => {
            let aggregator = settings.build_aggregator(&client)?;
            let items = aggregator.collect_all().await?;
            let count = items.len();
            aggregator.build_feed(items, &settings.output).await?;
            Ok(count)
        }
    }
}
