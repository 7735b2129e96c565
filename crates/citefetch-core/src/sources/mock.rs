//! Scripted source backend for tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use citefetch_bib::CanonicalRecord;

use super::SourceBackend;

/// A configurable response for [`MockSource`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Candidate records for this call.
    Records(Vec<CanonicalRecord>),
    /// No matches.
    Empty,
    /// Transport failure; degrades to an empty list at the trait boundary.
    Error(String),
}

/// A hand-rolled [`SourceBackend`] mock.
///
/// Either a fixed response for every call or a per-call sequence (the last
/// response repeats once exhausted), plus call counting.
pub struct MockSource {
    name: &'static str,
    /// Popped per call; `fallback` is used when empty.
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    call_count: AtomicUsize,
}

impl MockSource {
    /// Create a mock that always returns `response`.
    pub fn new(name: &'static str, response: MockResponse) -> Self {
        Self {
            name,
            responses: Mutex::new(Vec::new()),
            fallback: response,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns responses in order, repeating the last.
    pub fn with_sequence(name: &'static str, mut responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        // Reverse so we can pop() from the front cheaply.
        responses.reverse();
        let fallback = responses.first().cloned().unwrap();
        Self {
            name,
            responses: Mutex::new(responses),
            fallback,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> MockResponse {
        let mut responses = self.responses.lock().unwrap();
        match responses.len() {
            0 => self.fallback.clone(),
            1 => responses[0].clone(),
            _ => responses.pop().unwrap(),
        }
    }
}

impl SourceBackend for MockSource {
    fn name(&self) -> &str {
        self.name
    }

    fn search_by_title<'a>(
        &'a self,
        _title: &'a str,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Vec<CanonicalRecord>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let response = self.next_response();
        Box::pin(async move {
            match response {
                MockResponse::Records(records) => records,
                MockResponse::Empty => Vec::new(),
                MockResponse::Error(e) => {
                    tracing::warn!(source = self.name, error = %e, "search failed");
                    Vec::new()
                }
            }
        })
    }
}
