//! Run configuration.
//!
//! Every tunable of a crawl or report run lives in [`CrawlConfig`], which is
//! built once in `main` (defaults, then an optional YAML file, then CLI
//! overrides) and handed to each component. Nothing reads process-global
//! state, so tests construct configs with fixed dates and fake endpoints.
//!
//! # YAML example
//!
//! ```yaml
//! keywords: ["警示", "立案"]
//! start_date: 2024-01-01
//! output_path: data/announcements.csv
//! delay:
//!   min_ms: 500
//!   max_ms: 1500
//! ```

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::errors::CrawlError;

pub const DEFAULT_QUERY_URL: &str = "http://www.cninfo.com.cn/new/hisAnnouncement/query";
pub const DEFAULT_STATIC_BASE_URL: &str = "http://static.cninfo.com.cn/";
/// Upper bound for `window_days` and `report_window_days` (about a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Inclusive range, in milliseconds, of the pause between successful page
/// fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_ms: 1_000,
            max_ms: 3_000,
        }
    }
}

/// The resolved `[start, end]` date range of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Search keywords, crawled in order.
    pub keywords: Vec<String>,
    /// Explicit window start; defaults to `end - window_days`.
    pub start_date: Option<NaiveDate>,
    /// Explicit window end; defaults to today.
    pub end_date: Option<NaiveDate>,
    pub window_days: i64,
    pub output_path: PathBuf,
    pub progress_path: PathBuf,
    pub readme_path: PathBuf,
    /// Ignore the existing dataset and progress record.
    pub force_refresh: bool,
    pub delay: DelayRange,
    pub proxy: Option<String>,
    pub query_url: String,
    pub static_base_url: String,
    pub page_size: u32,
    /// Exchange/category tag sent as the `column` form field.
    pub column: String,
    /// Search mode sent as the `tabName` form field.
    pub tab_name: String,
    pub request_timeout_secs: u64,
    /// Offset used to turn publish timestamps into calendar dates.
    pub utc_offset_hours: i32,
    pub report_window_days: i64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            keywords: ["警示", "责令改正", "行政监管", "立案", "行政处罚"]
                .into_iter()
                .map(String::from)
                .collect(),
            start_date: None,
            end_date: None,
            window_days: 7,
            output_path: PathBuf::from("announcements.csv"),
            progress_path: PathBuf::from("progress.json"),
            readme_path: PathBuf::from("README.md"),
            force_refresh: false,
            delay: DelayRange::default(),
            proxy: None,
            query_url: DEFAULT_QUERY_URL.to_string(),
            static_base_url: DEFAULT_STATIC_BASE_URL.to_string(),
            page_size: 30,
            column: "szse".to_string(),
            tab_name: "fulltext".to_string(),
            request_timeout_secs: 15,
            utc_offset_hours: 8,
            report_window_days: 7,
        }
    }
}

impl CrawlConfig {
    /// Load configuration from a YAML file, or defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, CrawlError> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                let config: CrawlConfig = serde_yaml::from_str(&text)?;
                info!(path = %p.display(), "Loaded configuration file");
                config
            }
            None => CrawlConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.keywords.is_empty() {
            return Err(CrawlError::Config("at least one keyword is required".into()));
        }
        if self.delay.min_ms > self.delay.max_ms {
            return Err(CrawlError::Config(format!(
                "delay.min_ms ({}) exceeds delay.max_ms ({})",
                self.delay.min_ms, self.delay.max_ms
            )));
        }
        if self.page_size == 0 {
            return Err(CrawlError::Config("page_size must be positive".into()));
        }
        if !(0..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(CrawlError::Config(format!(
                "window_days ({}) must be between 0 and {MAX_WINDOW_DAYS}",
                self.window_days
            )));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.report_window_days) {
            return Err(CrawlError::Config(format!(
                "report_window_days ({}) must be between 1 and {MAX_WINDOW_DAYS}",
                self.report_window_days
            )));
        }
        if self.utc_offset().is_none() {
            return Err(CrawlError::Config(format!(
                "utc_offset_hours {} is out of range",
                self.utc_offset_hours
            )));
        }
        Ok(())
    }

    /// Resolve the crawl window relative to `today`.
    ///
    /// A default start that would fall before the earliest representable
    /// date is clamped to it.
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        let end = self.end_date.unwrap_or(today);
        let start = self.start_date.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(self.window_days.max(0).unsigned_abs()))
                .unwrap_or(NaiveDate::MIN)
        });
        DateWindow { start, end }
    }

    /// Wall-clock time at `now` in the configured offset, the same zone
    /// publish timestamps are converted in.
    pub fn local_now(&self, now: DateTime<Utc>) -> Result<NaiveDateTime, CrawlError> {
        let offset = self.utc_offset().ok_or_else(|| {
            CrawlError::Config(format!("utc_offset_hours {} is out of range", self.utc_offset_hours))
        })?;
        Ok(now.with_timezone(&offset).naive_local())
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        if self.utc_offset_hours.abs() > 23 {
            return None;
        }
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
    }
}
