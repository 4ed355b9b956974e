//! Data models for announcements, both as the search API returns them and as
//! they are persisted in the dataset.
//!
//! - [`RawAnnouncement`] / [`QueryResponse`]: the wire format of one search page
//! - [`Announcement`]: one normalized dataset row
//! - [`Identity`]: the `(title, publish_date)` key used for deduplication
//!
//! The wire structs use camelCase names through `serde(rename)` so the Rust
//! side keeps snake_case fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One page of results from the announcement search endpoint.
///
/// The endpoint answers `"announcements": null` when a query has no hits, so
/// the field is optional and [`QueryResponse::records`] flattens both shapes.
#[derive(Debug, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub announcements: Option<Vec<RawAnnouncement>>,
    /// Whether the server has further pages for this query.
    #[serde(default, rename = "hasMore")]
    pub has_more: bool,
}

impl QueryResponse {
    /// Records on this page, empty when the server sent none.
    pub fn records(&self) -> &[RawAnnouncement] {
        self.announcements.as_deref().unwrap_or_default()
    }

    pub fn into_records(self) -> Vec<RawAnnouncement> {
        self.announcements.unwrap_or_default()
    }
}

/// A single announcement exactly as returned by the search API.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawAnnouncement {
    /// Title, possibly containing `<em>` highlight markup.
    #[serde(default, rename = "announcementTitle")]
    pub title: Option<String>,
    #[serde(default, rename = "secCode")]
    pub sec_code: Option<String>,
    #[serde(default, rename = "secName")]
    pub sec_name: Option<String>,
    /// Publication time as milliseconds since the Unix epoch.
    #[serde(default, rename = "announcementTime")]
    pub announcement_time: Option<i64>,
    /// Document path relative to the static file host.
    #[serde(default, rename = "adjunctUrl")]
    pub adjunct_url: Option<String>,
}

/// A normalized announcement, one row of the dataset.
///
/// Field order matches the dataset's column order; `publish_date` and
/// `document_url` keep the historical column names `publish_time` and
/// `announcement_url`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Announcement {
    /// The search keyword that first surfaced this announcement.
    pub keyword: String,
    pub stock_code: Option<String>,
    pub stock_name: Option<String>,
    pub title: String,
    #[serde(rename = "publish_time")]
    pub publish_date: NaiveDate,
    #[serde(rename = "announcement_url")]
    pub document_url: Option<String>,
}

impl Announcement {
    pub fn identity(&self) -> Identity {
        Identity::new(&self.title, self.publish_date)
    }
}

/// Composite deduplication key.
///
/// Stock code is deliberately not part of the key: two issuers publishing an
/// identically titled notice on the same day collapse into one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub title: String,
    pub publish_date: NaiveDate,
}

impl Identity {
    pub fn new(title: &str, publish_date: NaiveDate) -> Self {
        Self {
            title: title.to_string(),
            publish_date,
        }
    }
}
