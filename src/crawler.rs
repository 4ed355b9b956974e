//! The incremental crawl run.
//!
//! ```text
//! INIT -> LOAD_PROGRESS -> (SKIP if start >= end)
//!      -> for each keyword: FETCH pages -> PARSE -> APPEND
//!      -> SAVE_PROGRESS(end, or start if any keyword failed) -> DONE
//! ```
//!
//! A keyword whose pagination fails keeps the records gathered before the
//! failure, checkpoints progress at the run's start date right away and the
//! run moves on to the next keyword. Dataset or progress write failures end
//! the run with an error.

use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use crate::api::SearchApi;
use crate::config::DelayRange;
use crate::errors::CrawlError;
use crate::outputs::dataset::Dataset;
use crate::parser::{ParseContext, parse_page};
use crate::scrapers::cninfo::{FetchOutcome, fetch_keyword};
use crate::store::identity::IdentityStore;
use crate::store::progress::{ProgressStore, ProgressTracker};

/// What a crawl run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Nothing to do because progress already reached `end`.
    pub skipped: bool,
    pub new_records: usize,
    pub failed_keywords: Vec<String>,
    /// Boundary written to the progress store, if any.
    pub checkpoint: Option<NaiveDate>,
}

/// Owns the per-run collaborators and drives one crawl.
pub struct Crawler<A, I, D, P> {
    api: A,
    identities: I,
    dataset: D,
    progress: ProgressTracker<P>,
    ctx: ParseContext,
    keywords: Vec<String>,
    pause: DelayRange,
}

impl<A, I, D, P> Crawler<A, I, D, P>
where
    A: SearchApi,
    I: IdentityStore,
    D: Dataset,
    P: ProgressStore,
{
    pub fn new(
        api: A,
        identities: I,
        dataset: D,
        progress: ProgressTracker<P>,
        ctx: ParseContext,
        keywords: Vec<String>,
        pause: DelayRange,
    ) -> Self {
        Self {
            api,
            identities,
            dataset,
            progress,
            ctx,
            keywords,
            pause,
        }
    }

    /// Crawl every keyword from the saved progress boundary up to `end`.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&mut self, end: NaiveDate) -> Result<RunReport, CrawlError> {
        let start = self.progress.load().await;
        let mut report = RunReport {
            start,
            end,
            skipped: false,
            new_records: 0,
            failed_keywords: Vec::new(),
            checkpoint: None,
        };

        if start >= end {
            info!(%start, %end, "Progress already covers the requested range; nothing to do");
            report.skipped = true;
            return Ok(report);
        }
        info!(%start, %end, keywords = self.keywords.len(), known = self.identities.len(), "Starting crawl");

        for keyword in &self.keywords {
            let outcome = fetch_keyword(&self.api, keyword, start, end, &self.pause).await;
            let fresh = parse_page(outcome.records(), keyword, &mut self.identities, &self.ctx);
            let appended = self.dataset.append(&fresh).await?;
            report.new_records += appended;

            match &outcome {
                FetchOutcome::Complete { pages, .. } => {
                    info!(keyword = %keyword, pages, new = appended, "Keyword complete");
                }
                FetchOutcome::Partial {
                    failed_page, error, ..
                } => {
                    error!(
                        keyword = %keyword,
                        page = failed_page,
                        error = %error,
                        new = appended,
                        "Keyword aborted; range will be retried next run"
                    );
                    let checkpoint = outcome.checkpoint(start, end);
                    self.progress.save(checkpoint).await?;
                    report.checkpoint = Some(checkpoint);
                    report.failed_keywords.push(keyword.clone());
                }
            }
        }

        let checkpoint = if report.failed_keywords.is_empty() {
            end
        } else {
            warn!(failed = ?report.failed_keywords, "Progress not advanced because some keywords failed");
            start
        };
        self.progress.save(checkpoint).await?;
        report.checkpoint = Some(checkpoint);

        info!(
            new_records = report.new_records,
            failed = report.failed_keywords.len(),
            %checkpoint,
            "Crawl finished"
        );
        Ok(report)
    }

    #[cfg(test)]
    fn progress(&self) -> &ProgressTracker<P> {
        &self.progress
    }
}
