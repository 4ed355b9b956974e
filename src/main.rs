//! # cninfo_watch
//!
//! Incrementally collects announcements from the cninfo (巨潮资讯) disclosure
//! search API for a list of keywords, keeps them in an append-only CSV
//! dataset and publishes a Markdown digest of the most recent ones.
//!
//! ## Usage
//!
//! ```sh
//! cninfo_watch crawl            # fetch and append new announcements
//! cninfo_watch report           # rewrite README.md from the dataset
//! ```
//!
//! ## Architecture
//!
//! A crawl is a single sequential pipeline:
//! 1. **Resume**: read the progress boundary and the identities already in the dataset
//! 2. **Fetching**: page through the search results of each keyword, one request at a time
//! 3. **Parsing**: normalize records and drop known `(title, date)` identities
//! 4. **Output**: append new rows to the dataset and checkpoint progress
//!
//! The report runs separately and only reads the dataset.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod crawler;
mod errors;
mod models;
mod outputs;
mod parser;
mod scrapers;
mod store;
#[cfg(test)]
mod testing;
mod utils;

use api::CninfoClient;
use cli::{Cli, Command, CrawlArgs, ReportArgs};
use config::CrawlConfig;
use crawler::Crawler;
use outputs::dataset::CsvDataset;
use outputs::markdown;
use parser::ParseContext;
use store::identity::load_identities;
use store::progress::{JsonProgressFile, ProgressTracker};
use utils::ensure_writable_dir;

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
    info!("cninfo_watch starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = CrawlConfig::load(args.config.as_deref())?;
    let result = match &args.command {
        Command::Crawl(crawl_args) => crawl(&mut config, crawl_args).await,
        Command::Report(report_args) => report(&mut config, report_args).await,
    };

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(?elapsed, secs = elapsed.as_secs(), "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

#[instrument(level = "info", skip_all)]
async fn crawl(config: &mut CrawlConfig, args: &CrawlArgs) -> Result<(), Box<dyn Error>> {
    args.apply(config);
    config.validate()?;

    let today = config.local_now(Utc::now())?.date();
    let window = config.window(today);
    info!(
        start = %window.start,
        end = %window.end,
        keywords = ?config.keywords,
        force_refresh = config.force_refresh,
        "Crawl configured"
    );

    // Early check: the dataset and progress files must be writable
    if let Err(e) = ensure_writable_dir(&config.output_path).await {
        error!(path = %config.output_path.display(), error = %e, "Dataset directory is not writable");
        return Err(e);
    }
    ensure_writable_dir(&config.progress_path).await?;

    let dataset = CsvDataset::new(&config.output_path);
    let identities = load_identities(&dataset, config.force_refresh).await;
    let progress = ProgressTracker::new(
        JsonProgressFile::new(&config.progress_path),
        config.force_refresh,
        window.start,
    );

    let mut crawler = Crawler::new(
        CninfoClient::new(config)?,
        identities,
        dataset,
        progress,
        ParseContext::from_config(config)?,
        config.keywords.clone(),
        config.delay,
    );
    let report = crawler.run(window.end).await?;

    if !report.failed_keywords.is_empty() {
        warn!(failed = ?report.failed_keywords, "Some keywords failed; they will be retried on the next run");
    }
    info!(
        new_records = report.new_records,
        skipped = report.skipped,
        path = %config.output_path.display(),
        "Crawl summary"
    );
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn report(config: &mut CrawlConfig, args: &ReportArgs) -> Result<(), Box<dyn Error>> {
    args.apply(config);
    config.validate()?;

    let now = config.local_now(Utc::now())?;
    let rows = markdown::write_report(config, now).await?;
    info!(rows, path = %config.readme_path.display(), "Report written");
    Ok(())
}
