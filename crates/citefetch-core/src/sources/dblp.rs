//! DBLP publication search adapter.
//!
//! DBLP's search response only carries summary hit info; the full record is
//! a per-hit plain-text BibTeX document at `<record url>.bib`. The adapter
//! fans the per-hit fetches out concurrently (capped) and gathers the
//! normalized records back in hit order.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use citefetch_bib::CanonicalRecord;

use super::{SourceBackend, fan_out_ordered};

const SEARCH_URL: &str = "https://dblp.org/search/publ/api";

pub struct Dblp {
    /// Cap on concurrent per-hit `.bib` fetches.
    pub max_concurrent_fetches: usize,
}

impl Dblp {
    pub fn new(max_concurrent_fetches: usize) -> Self {
        Self {
            max_concurrent_fetches,
        }
    }

    async fn try_search(
        &self,
        title: &str,
        client: &reqwest::Client,
        timeout: Duration,
    ) -> Result<Vec<CanonicalRecord>, String> {
        let url = format!(
            "{SEARCH_URL}?q={}&format=json",
            urlencoding::encode(title)
        );

        let resp = client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        let data: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
        let hits = data["result"]["hits"]["hit"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let client = client.clone();
        let records = fan_out_ordered(hits, self.max_concurrent_fetches, move |hit| {
            let client = client.clone();
            async move { fetch_record(&client, timeout, &hit).await }
        })
        .await;

        Ok(records)
    }
}

impl SourceBackend for Dblp {
    fn name(&self) -> &str {
        "DBLP"
    }

    fn search_by_title<'a>(
        &'a self,
        title: &'a str,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Vec<CanonicalRecord>> + Send + 'a>> {
        Box::pin(async move {
            match self.try_search(title, client, timeout).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(source = self.name(), error = %e, "search failed");
                    Vec::new()
                }
            }
        })
    }
}

/// Fetch and normalize one hit's BibTeX record. `None` drops the hit from
/// the result set; partial results are fine.
async fn fetch_record(
    client: &reqwest::Client,
    timeout: Duration,
    hit: &serde_json::Value,
) -> Option<CanonicalRecord> {
    let info = &hit["info"];
    let record_url = info["url"].as_str()?;
    let bib_url = format!("{record_url}.bib");

    let resp = match client.get(&bib_url).timeout(timeout).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::debug!(url = %bib_url, error = %e, "hit fetch failed, dropping");
            return None;
        }
    };
    if !resp.status().is_success() {
        tracing::debug!(url = %bib_url, status = %resp.status(), "hit fetch failed, dropping");
        return None;
    }
    let body = resp.text().await.ok()?;

    let mut record = match citefetch_bib::parse_entry(&body) {
        Ok(record) => record,
        Err(e) => {
            tracing::debug!(url = %bib_url, error = %e, "hit BibTeX unparseable, dropping");
            return None;
        }
    };

    // The search hit carries a little metadata of its own; use it to fill
    // gaps the BibTeX record leaves.
    for key in ["title", "venue", "year", "doi", "url"] {
        if let Some(value) = info[key].as_str() {
            record.set_if_absent(key, value);
        }
    }

    Some(record)
}
