//! Persistent outputs of the crawler.
//!
//! # Submodules
//!
//! - [`dataset`]: the append-only CSV dataset (write side of a crawl, read
//!   side of the identity store and the reporter)
//! - [`markdown`]: renders recent rows into the README digest
//!
//! # Output Structure
//!
//! ```text
//! ./
//! ├── announcements.csv   # every collected announcement, append-only
//! ├── progress.json       # last completed date boundary
//! └── README.md           # digest of the trailing week
//! ```

pub mod dataset;
pub mod markdown;
