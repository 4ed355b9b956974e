//! The append-only announcement dataset.
//!
//! Rows are stored in a CSV file encoded as UTF-8 with a byte-order mark so
//! spreadsheet applications detect the encoding. The header row is written
//! exactly once, when the file is created; every later write appends.
//!
//! # Columns
//!
//! ```text
//! keyword,stock_code,stock_name,title,publish_time,announcement_url
//! ```

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::errors::CrawlError;
use crate::models::Announcement;

pub const HEADER: [&str; 6] = [
    "keyword",
    "stock_code",
    "stock_name",
    "title",
    "publish_time",
    "announcement_url",
];

const BOM: &str = "\u{feff}";

/// Durable, append-only storage for announcements.
pub trait Dataset {
    /// Every row currently stored, in file order.
    async fn read_all(&self) -> Result<Vec<Announcement>, CrawlError>;

    /// Append `records`, returning how many rows were written.
    async fn append(&mut self, records: &[Announcement]) -> Result<usize, CrawlError>;
}

#[derive(Debug, Clone)]
pub struct CsvDataset {
    path: PathBuf,
}

impl CsvDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Dataset for CsvDataset {
    /// Rows that fail to decode are logged and skipped.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn read_all(&self) -> Result<Vec<Announcement>, CrawlError> {
        let text = fs::read_to_string(&self.path).await?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.trim_start_matches(BOM).as_bytes());

        let mut rows = Vec::new();
        for (line, result) in reader.deserialize::<Announcement>().enumerate() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => warn!(row = line + 1, error = %e, "Skipping undecodable dataset row"),
            }
        }
        Ok(rows)
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = records.len()))]
    async fn append(&mut self, records: &[Announcement]) -> Result<usize, CrawlError> {
        if records.is_empty() {
            return Ok(0);
        }

        let is_new = !fs::try_exists(&self.path).await?;
        let mut buf = Vec::new();
        if is_new {
            buf.extend_from_slice(BOM.as_bytes());
        }
        {
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut buf);
            if is_new {
                writer.write_record(HEADER)?;
            }
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;

        info!(count = records.len(), created = is_new, "Appended records to dataset");
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::announcement;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn dataset() -> (tempfile::TempDir, CsvDataset) {
        let tmp = tempfile::tempdir().unwrap();
        let dataset = CsvDataset::new(tmp.path().join("announcements.csv"));
        (tmp, dataset)
    }

    #[tokio::test]
    async fn test_append_empty_is_noop() {
        let (_tmp, mut dataset) = dataset();
        assert_eq!(dataset.append(&[]).await.unwrap(), 0);
        assert!(!dataset.path().exists());
    }

    #[tokio::test]
    async fn test_first_append_writes_bom_and_header() {
        let (_tmp, mut dataset) = dataset();
        let mut row = announcement("警示", "关于收到警示函的公告", date(1));
        row.stock_code = Some("000001".into());
        row.stock_name = Some("平安银行".into());
        row.document_url = Some("http://static.cninfo.com.cn/finalpage/1.PDF".into());
        dataset.append(&[row]).await.unwrap();

        let text = std::fs::read_to_string(dataset.path()).unwrap();
        assert_eq!(
            text,
            "\u{feff}keyword,stock_code,stock_name,title,publish_time,announcement_url\n\
             警示,000001,平安银行,关于收到警示函的公告,2024-01-01,http://static.cninfo.com.cn/finalpage/1.PDF\n"
        );
    }

    #[tokio::test]
    async fn test_second_append_keeps_single_header_and_prior_rows() {
        let (_tmp, mut dataset) = dataset();
        dataset.append(&[announcement("A", "First", date(1))]).await.unwrap();
        let before = std::fs::read_to_string(dataset.path()).unwrap();

        dataset.append(&[announcement("B", "Second", date(2))]).await.unwrap();
        let after = std::fs::read_to_string(dataset.path()).unwrap();

        assert!(after.starts_with(&before), "existing bytes must be untouched");
        assert_eq!(after.matches("keyword,stock_code").count(), 1);
        assert_eq!(after.matches('\u{feff}').count(), 1);
    }

    #[tokio::test]
    async fn test_read_all_round_trips_optional_fields() {
        let (_tmp, mut dataset) = dataset();
        let rows = vec![
            announcement("A", "No stock, \"quoted\"", date(1)),
            Announcement {
                stock_code: Some("002001".into()),
                ..announcement("B", "With stock", date(2))
            },
        ];
        dataset.append(&rows).await.unwrap();

        assert_eq!(dataset.read_all().await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_read_all_skips_bad_rows() {
        let (_tmp, dataset) = dataset();
        std::fs::write(
            dataset.path(),
            "\u{feff}keyword,stock_code,stock_name,title,publish_time,announcement_url\n\
             A,,,Good,2024-01-01,\n\
             A,,,Bad,not-a-date,\n",
        )
        .unwrap();

        let rows = dataset.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Good");
        assert_eq!(rows[0].stock_code, None);
    }

    #[tokio::test]
    async fn test_read_all_missing_file_is_error() {
        let (_tmp, dataset) = dataset();
        assert!(matches!(dataset.read_all().await, Err(CrawlError::Io(_))));
    }
}
