//! Metadata enrichment for bibliographic items.
//!
//! Given an item that carries little more than a title, the pipeline queries
//! a scholarly database ([`sources`]), lets a [`CandidateSelector`] pick one
//! of the normalized candidate records, and merges the chosen record's
//! fields into the item ([`reconcile`]) before committing it through its
//! [`ItemStore`].

pub mod config_file;
pub mod reconcile;
pub mod selector;
pub mod sources;
pub mod store;
pub mod updater;

// Re-export for convenience
pub use citefetch_bib::{BibError, CanonicalRecord, parse_entry};
pub use selector::{CandidateSelector, FirstCandidate};
pub use sources::SourceBackend;
pub use store::{Creator, Item, ItemId, ItemStore, ItemType, MemoryStore, StoreError, TypeChange};
pub use updater::{
    BatchSummary, ProgressEvent, SkipReason, UpdateOutcome, update_item, update_items,
};

/// Runtime configuration for the enrichment pipeline.
#[derive(Clone)]
pub struct Config {
    /// Semantic Scholar API key. Unauthenticated access works too, just
    /// rate-limited harder.
    pub s2_api_key: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// Cap on concurrent per-hit `.bib` fetches against DBLP.
    pub max_concurrent_fetches: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("s2_api_key", &self.s2_api_key.as_ref().map(|_| "***"))
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            s2_api_key: None,
            http_timeout_secs: 10,
            max_concurrent_fetches: 4,
        }
    }
}
