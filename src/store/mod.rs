//! Run state that survives between invocations.
//!
//! - [`identity`]: the set of `(title, publish_date)` keys already collected
//! - [`progress`]: the date boundary up to which the crawl has completed
//!
//! Both are rebuilt from disk at startup; the dataset and the progress file
//! are the only source of truth across runs.

pub mod identity;
pub mod progress;
