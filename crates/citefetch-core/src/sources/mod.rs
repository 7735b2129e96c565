//! Source adapters for querying scholarly databases by title.

pub mod dblp;
pub mod semantic_scholar;

#[cfg(test)]
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use citefetch_bib::CanonicalRecord;
use tokio::sync::Semaphore;

/// A database that can be searched by publication title.
pub trait SourceBackend: Send + Sync {
    /// The canonical name of this source (e.g., "DBLP").
    fn name(&self) -> &str;

    /// Search the source for candidate records matching the given title.
    ///
    /// Never fails past this boundary: transport and parse failures are
    /// logged and degrade to an empty list.
    fn search_by_title<'a>(
        &'a self,
        title: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Vec<CanonicalRecord>> + Send + 'a>>;
}

/// Run `op` over `inputs` concurrently, at most `limit` at a time, and
/// gather the successful outputs back into input order. Slots whose `op`
/// returns `None` are dropped; the relative order of the rest is preserved.
pub(crate) async fn fan_out_ordered<T, U, F, Fut>(inputs: Vec<T>, limit: usize, op: F) -> Vec<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<U>> + Send + 'static,
{
    let total = inputs.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let op = Arc::new(op);

    let mut join_set = tokio::task::JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let op = Arc::clone(&op);
        join_set.spawn(async move {
            // The semaphore is never closed, so acquire only fails if the
            // runtime is shutting down; treat that as a dropped slot.
            let Ok(_permit) = semaphore.acquire().await else {
                return (index, None);
            };
            (index, op(input).await)
        });
    }

    let mut slots: Vec<Option<U>> = std::iter::repeat_with(|| None).take(total).collect();
    while let Some(joined) = join_set.join_next().await {
        if let Ok((index, output)) = joined {
            slots[index] = output;
        }
    }
    slots.into_iter().flatten().collect()
}
