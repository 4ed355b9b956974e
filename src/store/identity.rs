//! Identity store used for deduplication.
//!
//! The store must contain every identity already present in the dataset
//! before any new record is accepted, and an identity once inserted is never
//! removed for the rest of the run. The same store therefore also catches an
//! announcement that shows up under two keywords in one run.

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use crate::models::{Announcement, Identity};
use crate::outputs::dataset::Dataset;

/// Membership set over announcement identities.
pub trait IdentityStore {
    fn contains(&self, id: &Identity) -> bool;

    /// Register `id`; returns `true` if it was not known before.
    fn insert(&mut self, id: Identity) -> bool;

    fn len(&self) -> usize;

    /// Register the identity of every row in `rows`.
    fn bulk_load<'a, I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = &'a Announcement>,
        Self: Sized,
    {
        for row in rows {
            self.insert(row.identity());
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    seen: HashSet<Identity>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn contains(&self, id: &Identity) -> bool {
        self.seen.contains(id)
    }

    fn insert(&mut self, id: Identity) -> bool {
        self.seen.insert(id)
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

/// Build the identity store for a run from the existing dataset.
///
/// With `force_refresh` the dataset is not consulted. A missing or unreadable
/// dataset is not an error: it is logged and the run starts with no prior
/// data.
#[instrument(level = "info", skip_all, fields(force_refresh))]
pub async fn load_identities<D: Dataset>(dataset: &D, force_refresh: bool) -> MemoryIdentityStore {
    let mut store = MemoryIdentityStore::new();
    if force_refresh {
        info!("Force refresh requested; ignoring existing dataset");
        return store;
    }

    match dataset.read_all().await {
        Ok(rows) => {
            store.bulk_load(&rows);
            info!(rows = rows.len(), identities = store.len(), "Loaded existing identities");
        }
        Err(e) => {
            warn!(error = %e, "Could not read existing dataset; starting with no prior data");
        }
    }
    store
}
