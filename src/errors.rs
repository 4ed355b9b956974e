use std::io;

use thiserror::Error;

/// Error type shared by the crawl and report pipelines.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("request to the search API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search API answered page {page} with HTTP {status}")]
    Status { page: u32, status: u16 },
    #[error("search API returned an undecodable body for page {page}: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },
    #[error("dataset error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid progress record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
}
