//! The item-update pipeline: search by title, let the user pick a
//! candidate, reconcile it into the item, commit.

use std::fmt;
use std::time::Duration;

use crate::Config;
use crate::reconcile;
use crate::selector::CandidateSelector;
use crate::sources::SourceBackend;
use crate::store::{ItemId, ItemStore, StoreError};

/// Why an item was left untouched. All of these are normal outcomes, not
/// errors; callers should report them neutrally at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyTitle,
    NoResults,
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::EmptyTitle => "item has no title",
            SkipReason::NoResults => "no search results",
            SkipReason::Cancelled => "selection cancelled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The item was updated and committed; the id may differ from the input
    /// id after a type migration.
    Updated(ItemId),
    Skipped(SkipReason),
}

/// Progress events emitted during a batch update.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Searching {
        index: usize,
        total: usize,
        title: String,
    },
    Finished {
        index: usize,
        total: usize,
        /// `None` means the item's update failed (logged, not surfaced).
        outcome: Option<UpdateOutcome>,
    },
}

/// Final tally of a batch update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub updated: usize,
}

/// Update a single item from `source`.
///
/// Searches by the item's title, has `selector` disambiguate, reconciles the
/// chosen record into the item and commits. An empty title, zero results or
/// a cancelled selection skip the item without touching it.
pub async fn update_item(
    store: &mut dyn ItemStore,
    item_id: ItemId,
    source: &dyn SourceBackend,
    selector: &dyn CandidateSelector,
    client: &reqwest::Client,
    config: &Config,
) -> Result<UpdateOutcome, StoreError> {
    let title = store.get_field(item_id, "title")?.unwrap_or_default();
    if title.trim().is_empty() {
        return Ok(UpdateOutcome::Skipped(SkipReason::EmptyTitle));
    }

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let candidates = source.search_by_title(&title, client, timeout).await;
    if candidates.is_empty() {
        return Ok(UpdateOutcome::Skipped(SkipReason::NoResults));
    }

    let record = match selector.select(&candidates).and_then(|i| candidates.get(i)) {
        Some(record) => record,
        None => return Ok(UpdateOutcome::Skipped(SkipReason::Cancelled)),
    };

    let new_id = reconcile::apply(record, store, item_id)?;
    tracing::info!(item = item_id, new_item = new_id, source = source.name(), "item updated");
    Ok(UpdateOutcome::Updated(new_id))
}

/// Update a batch of items, strictly one at a time.
///
/// Candidate selection is an interactive, single-focus decision, so items
/// never overlap. One item's failure does not abort the batch: it is logged,
/// reported through the progress callback and counted against the tally.
pub async fn update_items(
    store: &mut dyn ItemStore,
    item_ids: &[ItemId],
    source: &dyn SourceBackend,
    selector: &dyn CandidateSelector,
    client: &reqwest::Client,
    config: &Config,
    progress: impl Fn(ProgressEvent),
) -> BatchSummary {
    let total = item_ids.len();
    let mut updated = 0;

    for (index, &item_id) in item_ids.iter().enumerate() {
        let title = store
            .get_field(item_id, "title")
            .ok()
            .flatten()
            .unwrap_or_default();
        progress(ProgressEvent::Searching {
            index,
            total,
            title,
        });

        let outcome = match update_item(store, item_id, source, selector, client, config).await {
            Ok(outcome) => {
                if matches!(outcome, UpdateOutcome::Updated(_)) {
                    updated += 1;
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!(item = item_id, error = %e, "item update failed");
                None
            }
        };
        progress(ProgressEvent::Finished {
            index,
            total,
            outcome,
        });
    }

    BatchSummary { total, updated }
}
