//! Semantic Scholar graph API adapter.
//!
//! Unlike DBLP there is no secondary per-record fetch: the search response
//! embeds a BibTeX citation string per paper (`citationStyles.bibtex`), so
//! normalizing the batch is purely CPU-bound.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use citefetch_bib::CanonicalRecord;

use super::SourceBackend;

const SEARCH_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const RESULT_LIMIT: usize = 10;
const SEARCH_FIELDS: &str = "title,abstract,venue,citationCount,citationStyles";

pub struct SemanticScholar {
    /// Optional API key; unauthenticated access works, just rate-limited.
    pub api_key: Option<String>,
}

impl SemanticScholar {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    async fn try_search(
        &self,
        title: &str,
        client: &reqwest::Client,
        timeout: Duration,
    ) -> Result<Vec<CanonicalRecord>, String> {
        let url = format!(
            "{SEARCH_URL}?query={}&limit={RESULT_LIMIT}&fields={SEARCH_FIELDS}",
            urlencoding::encode(title)
        );

        let mut req = client.get(&url).timeout(timeout);
        if let Some(ref key) = self.api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req.send().await.map_err(|e| e.to_string())?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        let data: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
        let papers = data["data"].as_array().cloned().unwrap_or_default();

        let mut records = Vec::new();
        for paper in &papers {
            let Some(bibtex) = paper["citationStyles"]["bibtex"].as_str() else {
                tracing::debug!("paper without bibtex citation, dropping");
                continue;
            };
            match citefetch_bib::parse_entry(bibtex) {
                Ok(mut record) => {
                    // The payload carries fields the citation string lacks.
                    if let Some(abstract_text) = paper["abstract"].as_str() {
                        record.set_if_absent("abstract", abstract_text);
                    }
                    if let Some(venue) = paper["venue"].as_str() {
                        record.set_if_absent("venue", venue);
                    }
                    records.push(record);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "paper citation unparseable, dropping");
                }
            }
        }
        Ok(records)
    }
}

impl SourceBackend for SemanticScholar {
    fn name(&self) -> &str {
        "Semantic Scholar"
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
