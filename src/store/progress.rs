//! Progress checkpointing across runs.
//!
//! The progress record holds a single date: the boundary up to which the
//! crawl has completed. A run reads it to choose its start date and writes it
//! back at the end (or at the first failure) so that the next run resumes
//! instead of restarting.
//!
//! # File format
//!
//! ```json
//! {"last_date": "2024-01-31"}
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::errors::CrawlError;

/// Persistence for the progress boundary.
pub trait ProgressStore {
    /// The stored boundary, or `None` if nothing has been stored yet.
    async fn read(&self) -> Result<Option<NaiveDate>, CrawlError>;

    /// Overwrite the stored boundary.
    async fn write(&mut self, date: NaiveDate) -> Result<(), CrawlError>;
}

#[derive(Debug, Deserialize, Serialize)]
struct ProgressRecord {
    last_date: NaiveDate,
}

/// A small JSON file holding the progress boundary.
#[derive(Debug, Clone)]
pub struct JsonProgressFile {
    path: PathBuf,
}

impl JsonProgressFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProgressStore for JsonProgressFile {
    async fn read(&self) -> Result<Option<NaiveDate>, CrawlError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: ProgressRecord = serde_json::from_str(&text)?;
        Ok(Some(record.last_date))
    }

    async fn write(&mut self, date: NaiveDate) -> Result<(), CrawlError> {
        let json = serde_json::to_string(&ProgressRecord { last_date: date })?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Chooses the start boundary of a run and records where it got to.
#[derive(Debug)]
pub struct ProgressTracker<S> {
    store: S,
    force_refresh: bool,
    window_start: NaiveDate,
}

impl<S: ProgressStore> ProgressTracker<S> {
    pub fn new(store: S, force_refresh: bool, window_start: NaiveDate) -> Self {
        Self {
            store,
            force_refresh,
            window_start,
        }
    }

    /// Start date for this run.
    ///
    /// The persisted boundary when one exists and no force refresh was
    /// requested; the configured window start otherwise. An unreadable record
    /// is logged and treated as absent.
    #[instrument(level = "info", skip(self), fields(window_start = %self.window_start))]
    pub async fn load(&self) -> NaiveDate {
        if self.force_refresh {
            info!("Force refresh requested; using configured window start");
            return self.window_start;
        }
        match self.store.read().await {
            Ok(Some(date)) => {
                info!(%date, "Resuming from saved progress");
                date
            }
            Ok(None) => {
                debug!("No saved progress");
                self.window_start
            }
            Err(e) => {
                warn!(error = %e, "Could not read progress record; using configured window start");
                self.window_start
            }
        }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn save(&mut self, date: NaiveDate) -> Result<(), CrawlError> {
        self.store.write(date).await?;
        info!(%date, "Saved progress");
        Ok(())
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryProgress;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_json_file_missing_reads_none() {
        let tmp = tempfile::tempdir().unwrap();
        let file = JsonProgressFile::new(tmp.path().join("progress.json"));
        assert_eq!(file.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_file_write_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("progress.json");
        let mut file = JsonProgressFile::new(&path);
        file.write(date(15)).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"last_date":"2024-01-15"}"#
        );
        assert_eq!(file.read().await.unwrap(), Some(date(15)));
    }

    #[tokio::test]
    async fn test_json_file_corrupt_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("progress.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonProgressFile::new(&path).read().await,
            Err(CrawlError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_load_without_record_uses_window_start() {
        let tracker = ProgressTracker::new(MemoryProgress::default(), false, date(1));
        assert_eq!(tracker.load().await, date(1));
    }

    #[tokio::test]
    async fn test_load_prefers_saved_boundary() {
        let tracker = ProgressTracker::new(MemoryProgress::with(date(20)), false, date(1));
        assert_eq!(tracker.load().await, date(20));
    }

    #[tokio::test]
    async fn test_load_force_refresh_ignores_saved_boundary() {
        let tracker = ProgressTracker::new(MemoryProgress::with(date(20)), true, date(1));
        assert_eq!(tracker.load().await, date(1));
    }

    #[tokio::test]
    async fn test_load_corrupt_record_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("progress.json");
        std::fs::write(&path, "{").unwrap();
        let tracker = ProgressTracker::new(JsonProgressFile::new(&path), false, date(3));
        assert_eq!(tracker.load().await, date(3));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let mut tracker = ProgressTracker::new(MemoryProgress::with(date(5)), false, date(1));
        tracker.save(date(9)).await.unwrap();
        assert_eq!(tracker.load().await, date(9));
        assert_eq!(tracker.store().saved, vec![date(9)]);
    }
}
