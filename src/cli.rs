//! Command-line interface definitions for cninfo_watch.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Flags override values from the optional YAML configuration file, which in
//! turn override the built-in defaults.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CrawlConfig;

/// Command-line arguments for cninfo_watch.
///
/// # Examples
///
/// ```sh
/// # Crawl the default keywords over the trailing week
/// cninfo_watch crawl
///
/// # Crawl two keywords over an explicit range, ignoring prior data
/// cninfo_watch crawl -k 立案 -k 警示 --start-date 2024-01-01 --end-date 2024-01-31 --force
///
/// # Regenerate README.md from the dataset
/// cninfo_watch report --days 7
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true, env = "CNINFO_WATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch new announcements and append them to the dataset
    Crawl(CrawlArgs),
    /// Render the recent-announcements digest from the dataset
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub struct CrawlArgs {
    /// Search keyword; repeat to crawl several (replaces the configured list)
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// First publish date to search (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last publish date to search (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Dataset CSV path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Progress record path
    #[arg(short, long)]
    pub progress: Option<PathBuf>,

    /// Ignore the existing dataset and saved progress
    #[arg(short, long)]
    pub force: bool,

    /// Proxy URL for all requests
    #[arg(long, env = "CNINFO_PROXY")]
    pub proxy: Option<String>,
}

impl CrawlArgs {
    pub fn apply(&self, config: &mut CrawlConfig) {
        if !self.keywords.is_empty() {
            config.keywords = self.keywords.clone();
        }
        if self.start_date.is_some() {
            config.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            config.end_date = self.end_date;
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(progress) = &self.progress {
            config.progress_path = progress.clone();
        }
        if self.force {
            config.force_refresh = true;
        }
        if self.proxy.is_some() {
            config.proxy = self.proxy.clone();
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    /// Dataset CSV path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// README path to write
    #[arg(short, long)]
    pub readme: Option<PathBuf>,

    /// Size of the trailing window in days
    #[arg(short, long)]
    pub days: Option<i64>,
}

impl ReportArgs {
    pub fn apply(&self, config: &mut CrawlConfig) {
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(readme) = &self.readme {
            config.readme_path = readme.clone();
        }
        if let Some(days) = self.days {
            config.report_window_days = days;
        }
    }
}
