//! Utility functions for text cleanup, timestamp conversion, pacing and file
//! system checks.
//!
//! - Highlight markup removal for search result titles
//! - Epoch-millisecond to calendar date conversion in a fixed UTC offset
//! - String truncation for logging
//! - Random courtesy pause between page requests
//! - File system validation for output paths

use chrono::{DateTime, FixedOffset, NaiveDate};
use once_cell::sync::Lazy;
use rand::{Rng, rng};
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::config::DelayRange;

static HIGHLIGHT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?em>").unwrap());

/// Remove the `<em>`/`</em>` markup the search endpoint wraps around
/// keyword matches when highlighting is on.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_highlight("关于<em>立案</em>的公告"), "关于立案的公告");
/// ```
pub fn strip_highlight(title: &str) -> String {
    HIGHLIGHT_TAG.replace_all(title, "").into_owned()
}

/// Convert an epoch-millisecond timestamp into the calendar date observed in
/// `offset`.
///
/// Returns `None` for timestamps outside chrono's representable range.
pub fn epoch_millis_to_date(millis: i64, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&offset).date_naive())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary no later than `max` bytes
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Sleep for a random duration drawn from `range`.
///
/// A zero-width range at zero returns immediately, which is what tests use.
pub async fn courtesy_pause(range: &DelayRange) {
    if range.max_ms == 0 {
        return;
    }
    let millis: u64 = rng().random_range(range.min_ms..=range.max_ms);
    debug!(millis, "Pausing before next page");
    sleep(Duration::from_millis(millis)).await;
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// The parent directory is created if missing, then a probe file is created
/// and immediately deleted.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(file = %file.display()))]
pub async fn ensure_writable_dir(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;
    // Sync probe keeps the error surface simple
    let probe_path = dir.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!(dir = %dir.display(), "Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
