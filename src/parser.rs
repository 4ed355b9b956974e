//! Normalization and deduplication of raw search results.
//!
//! Each raw record is cleaned (highlight markup removed, timestamp turned into
//! a calendar date, document path resolved against the static host) and then
//! checked against the identity store. New identities are registered as soon
//! as they are accepted, so a repeat later in the same page, on a later page,
//! or under another keyword in the same run is dropped.

use chrono::FixedOffset;
use tracing::{debug, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::errors::CrawlError;
use crate::models::{Announcement, Identity, RawAnnouncement};
use crate::store::identity::IdentityStore;
use crate::utils::{epoch_millis_to_date, strip_highlight};

/// Settings the parser needs from the run configuration.
#[derive(Debug, Clone)]
pub struct ParseContext {
    static_base: Url,
    offset: FixedOffset,
}

impl ParseContext {
    pub fn new(static_base_url: &str, offset: FixedOffset) -> Result<Self, CrawlError> {
        let mut base = static_base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let static_base = Url::parse(&base)
            .map_err(|e| CrawlError::Config(format!("invalid static_base_url {base:?}: {e}")))?;
        Ok(Self { static_base, offset })
    }

    pub fn from_config(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let offset = config.utc_offset().ok_or_else(|| {
            CrawlError::Config(format!(
                "utc_offset_hours {} is out of range",
                config.utc_offset_hours
            ))
        })?;
        Self::new(&config.static_base_url, offset)
    }

    fn document_url(&self, adjunct: &str) -> Option<String> {
        match self.static_base.join(adjunct.trim_start_matches('/')) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!(adjunct, error = %e, "Could not resolve document URL");
                None
            }
        }
    }
}

/// Turn one page of raw records into new announcements attributed to
/// `keyword`, registering each accepted identity in `identities`.
///
/// Records without a usable timestamp are logged and skipped.
pub fn parse_page<I: IdentityStore>(
    raw: &[RawAnnouncement],
    keyword: &str,
    identities: &mut I,
    ctx: &ParseContext,
) -> Vec<Announcement> {
    let mut accepted = Vec::new();

    for item in raw {
        let title = strip_highlight(item.title.as_deref().unwrap_or_default());

        let Some(publish_date) = item
            .announcement_time
            .and_then(|ms| epoch_millis_to_date(ms, ctx.offset))
        else {
            warn!(keyword, %title, time = ?item.announcement_time, "Record has no usable timestamp; skipping");
            continue;
        };

        let identity = Identity::new(&title, publish_date);
        if identities.contains(&identity) {
            debug!(keyword, %title, %publish_date, "Duplicate announcement");
            continue;
        }

        accepted.push(Announcement {
            keyword: keyword.to_string(),
            stock_code: item.sec_code.clone(),
            stock_name: item.sec_name.clone(),
            title,
            publish_date,
            document_url: item
                .adjunct_url
                .as_deref()
                .and_then(|path| ctx.document_url(path)),
        });
        identities.insert(identity);
    }

    debug!(keyword, raw = raw.len(), accepted = accepted.len(), "Parsed page");
    accepted
}
