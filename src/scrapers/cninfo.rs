//! Keyword pagination over the cninfo search API.
//!
//! Pages are requested one at a time starting from page 1. Pagination ends
//! when a page carries no records, when the server reports `hasMore: false`,
//! or at the first failed request. There is no retry: a failure ends the
//! keyword and the caller re-crawls the whole range on the next run.

use chrono::NaiveDate;
use tracing::{error, info, instrument};

use crate::api::{PageQuery, SearchApi};
use crate::config::DelayRange;
use crate::errors::CrawlError;
use crate::models::RawAnnouncement;
use crate::utils::courtesy_pause;

/// Result of paginating one keyword.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Every page was fetched.
    Complete {
        records: Vec<RawAnnouncement>,
        pages: u32,
    },
    /// Fetching stopped at `failed_page`; `records` holds the pages before it.
    Partial {
        records: Vec<RawAnnouncement>,
        pages: u32,
        failed_page: u32,
        error: CrawlError,
    },
}

impl FetchOutcome {
    pub fn records(&self) -> &[RawAnnouncement] {
        match self {
            FetchOutcome::Complete { records, .. } | FetchOutcome::Partial { records, .. } => records,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, FetchOutcome::Complete { .. })
    }

    /// The progress boundary the caller should persist for this keyword.
    ///
    /// A partial fetch does not advance progress: the whole range is retried.
    pub fn checkpoint(&self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        if self.is_complete() { end } else { start }
    }
}

/// Fetch every page of search results for `keyword` in `[start, end]`.
///
/// A random pause drawn from `pause` separates successful page fetches.
#[instrument(level = "info", skip(api, pause))]
pub async fn fetch_keyword<A: SearchApi>(
    api: &A,
    keyword: &str,
    start: NaiveDate,
    end: NaiveDate,
    pause: &DelayRange,
) -> FetchOutcome {
    let mut records = Vec::new();
    let mut page = 1u32;

    loop {
        info!(keyword, page, "Fetching page");
        let query = PageQuery {
            keyword,
            start,
            end,
            page,
        };

        let response = match api.query_page(&query).await {
            Ok(r) => r,
            Err(e) => {
                error!(keyword, page, error = %e, "Page request failed; abandoning keyword");
                return FetchOutcome::Partial {
                    records,
                    pages: page - 1,
                    failed_page: page,
                    error: e,
                };
            }
        };

        let has_more = response.has_more;
        let batch = response.into_records();
        if batch.is_empty() {
            info!(keyword, page, "Empty page; pagination finished");
            return FetchOutcome::Complete {
                records,
                pages: page - 1,
            };
        }
        records.extend(batch);

        if !has_more {
            info!(keyword, page, total = records.len(), "Last page reached");
            return FetchOutcome::Complete {
                records,
                pages: page,
            };
        }

        page += 1;
        courtesy_pause(pause).await;
    }
}
