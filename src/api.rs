//! Client for the cninfo announcement search endpoint.
//!
//! # Architecture
//!
//! - [`SearchApi`]: the seam the fetcher talks to; one call fetches one page
//! - [`CninfoClient`]: the `reqwest` implementation used in production
//!
//! The client is single-shot: a failed request is reported to the caller as
//! a [`CrawlError`] and never retried here. Deciding what a failure means for
//! progress is the orchestrator's job.
//!
//! # Request
//!
//! A form-encoded `POST` with the fields:
//!
//! | Field | Value |
//! |-------|-------|
//! | `pageNum` | 1-based page number |
//! | `pageSize` | configured page size (30) |
//! | `column` | category tag (`szse`) |
//! | `tabName` | search mode (`fulltext`) |
//! | `searchkey` | keyword |
//! | `seDate` | `YYYY-MM-DD~YYYY-MM-DD` |
//! | `sortName` / `sortType` | `pubdate` / `desc` |
//! | `isHLtitle` | `true` |

use chrono::NaiveDate;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Proxy};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::config::CrawlConfig;
use crate::errors::CrawlError;
use crate::models::QueryResponse;
use crate::utils::truncate_for_log;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Parameters of one page request.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub keyword: &'a str,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 1-based page number.
    pub page: u32,
}

impl PageQuery<'_> {
    /// The `seDate` range string, `start~end`.
    pub fn date_range(&self) -> String {
        format!("{}~{}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

/// Trait for the remote search service.
///
/// Implementors return one decoded page per call. The production client is
/// [`CninfoClient`]; tests substitute scripted responses.
pub trait SearchApi {
    async fn query_page(&self, query: &PageQuery<'_>) -> Result<QueryResponse, CrawlError>;
}

/// `reqwest`-backed [`SearchApi`] implementation.
#[derive(Debug, Clone)]
pub struct CninfoClient {
    http: Client,
    query_url: String,
    page_size: u32,
    column: String,
    tab_name: String,
}

impl CninfoClient {
    /// Build a client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the TLS backend cannot
    /// be initialized.
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        Ok(Self {
            http: builder.build()?,
            query_url: config.query_url.clone(),
            page_size: config.page_size,
            column: config.column.clone(),
            tab_name: config.tab_name.clone(),
        })
    }

    fn form(&self, query: &PageQuery<'_>) -> Vec<(&'static str, String)> {
        vec![
            ("pageNum", query.page.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("column", self.column.clone()),
            ("tabName", self.tab_name.clone()),
            ("searchkey", query.keyword.to_string()),
            ("seDate", query.date_range()),
            ("sortName", "pubdate".to_string()),
            ("sortType", "desc".to_string()),
            ("isHLtitle", "true".to_string()),
        ]
    }
}

impl SearchApi for CninfoClient {
    #[instrument(level = "debug", skip(self), fields(keyword = %query.keyword, page = query.page))]
    async fn query_page(&self, query: &PageQuery<'_>) -> Result<QueryResponse, CrawlError> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.query_url)
            .header(
                CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .form(&self.form(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Search API returned an error status");
            return Err(CrawlError::Status {
                page: query.page,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let page: QueryResponse = serde_json::from_str(&body).map_err(|source| {
            warn!(body = %truncate_for_log(&body, 300), "Search API body is not a result page");
            CrawlError::Decode {
                page: query.page,
                source,
            }
        })?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            records = page.records().len(),
            has_more = page.has_more,
            "Fetched result page"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn client_for(server: &MockServer) -> CninfoClient {
        let config = CrawlConfig {
            query_url: format!("{}/new/hisAnnouncement/query", server.uri()),
            ..CrawlConfig::default()
        };
        CninfoClient::new(&config).unwrap()
    }

    #[test]
    fn test_date_range_format() {
        let query = PageQuery {
            keyword: "立案",
            start: date(1),
            end: date(7),
            page: 1,
        };
        assert_eq!(query.date_range(), "2024-01-01~2024-01-07");
    }

    #[tokio::test]
    async fn test_query_page_sends_form_and_decodes() {
        let server = MockServer::start().await;
        let body = r#"{
            "announcements": [{
                "announcementTitle": "Notice <em>A</em>",
                "secCode": "000001",
                "secName": "Alpha",
                "announcementTime": 1704067200000,
                "adjunctUrl": "finalpage/2024-01-01/1.PDF"
            }],
            "hasMore": false
        }"#;

        Mock::given(method("POST"))
            .and(path("/new/hisAnnouncement/query"))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .and(body_string_contains("pageNum=2"))
            .and(body_string_contains("pageSize=30"))
            .and(body_string_contains("column=szse"))
            .and(body_string_contains("tabName=fulltext"))
            .and(body_string_contains("searchkey=A"))
            .and(body_string_contains("seDate=2024-01-01%7E2024-01-07"))
            .and(body_string_contains("sortName=pubdate"))
            .and(body_string_contains("sortType=desc"))
            .and(body_string_contains("isHLtitle=true"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let page = client
            .query_page(&PageQuery {
                keyword: "A",
                start: date(1),
                end: date(7),
                page: 2,
            })
            .await
            .unwrap();

        assert!(!page.has_more);
        assert_eq!(page.records().len(), 1);
        assert_eq!(page.records()[0].sec_name.as_deref(), Some("Alpha"));
    }

    #[tokio::test]
    async fn test_query_page_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .query_page(&PageQuery {
                keyword: "A",
                start: date(1),
                end: date(7),
                page: 3,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Status { page: 3, status: 503 }));
    }

    #[tokio::test]
    async fn test_query_page_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .query_page(&PageQuery {
                keyword: "A",
                start: date(1),
                end: date(7),
                page: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Decode { page: 1, .. }));
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let config = CrawlConfig {
            proxy: Some("not a url".into()),
            ..CrawlConfig::default()
        };
        assert!(CninfoClient::new(&config).is_err());
    }
}
