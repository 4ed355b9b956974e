//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::api::{PageQuery, SearchApi};
use crate::errors::CrawlError;
use crate::models::{Announcement, QueryResponse, RawAnnouncement};
use crate::store::progress::ProgressStore;

pub fn announcement(keyword: &str, title: &str, publish_date: NaiveDate) -> Announcement {
    Announcement {
        keyword: keyword.to_string(),
        stock_code: None,
        stock_name: None,
        title: title.to_string(),
        publish_date,
        document_url: None,
    }
}

pub fn raw(title: &str, millis: i64) -> RawAnnouncement {
    RawAnnouncement {
        title: Some(title.to_string()),
        announcement_time: Some(millis),
        ..RawAnnouncement::default()
    }
}

enum Scripted {
    Page(Vec<RawAnnouncement>, bool),
    Fail,
}

/// A [`SearchApi`] that answers from a fixed script keyed by keyword and
/// page. Unscripted pages come back empty.
#[derive(Default)]
pub struct ScriptedApi {
    script: HashMap<(String, u32), Scripted>,
    requests: RefCell<Vec<(String, u32)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, keyword: &str, page: u32, records: Vec<RawAnnouncement>, has_more: bool) -> Self {
        self.script
            .insert((keyword.to_string(), page), Scripted::Page(records, has_more));
        self
    }

    pub fn fail(mut self, keyword: &str, page: u32) -> Self {
        self.script.insert((keyword.to_string(), page), Scripted::Fail);
        self
    }

    pub fn requested(&self) -> Vec<(String, u32)> {
        self.requests.borrow().clone()
    }
}

impl SearchApi for ScriptedApi {
    async fn query_page(&self, query: &PageQuery<'_>) -> Result<QueryResponse, CrawlError> {
        let key = (query.keyword.to_string(), query.page);
        self.requests.borrow_mut().push(key.clone());
        match self.script.get(&key) {
            Some(Scripted::Page(records, has_more)) => Ok(QueryResponse {
                announcements: Some(records.clone()),
                has_more: *has_more,
            }),
            Some(Scripted::Fail) => Err(CrawlError::Status {
                page: query.page,
                status: 502,
            }),
            None => Ok(QueryResponse::default()),
        }
    }
}

/// In-memory [`ProgressStore`] that remembers every write.
#[derive(Debug, Default)]
pub struct MemoryProgress {
    pub current: Option<NaiveDate>,
    pub saved: Vec<NaiveDate>,
}

impl MemoryProgress {
    pub fn with(date: NaiveDate) -> Self {
        Self {
            current: Some(date),
            saved: Vec::new(),
        }
    }
}

impl ProgressStore for MemoryProgress {
    async fn read(&self) -> Result<Option<NaiveDate>, CrawlError> {
        Ok(self.current)
    }

    async fn write(&mut self, date: NaiveDate) -> Result<(), CrawlError> {
        self.current = Some(date);
        self.saved.push(date);
        Ok(())
    }
}
