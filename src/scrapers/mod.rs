//! Paginated fetchers for announcement sources.
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | cninfo | [`cninfo`] | Form `POST` search API | Paged, newest first, keyword full-text search |
//!
//! A fetcher walks the pages of one keyword's search over one date range and
//! hands back a typed [`cninfo::FetchOutcome`]; it never swallows an error.

pub mod cninfo;
