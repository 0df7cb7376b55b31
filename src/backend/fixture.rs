//! In-memory search backend
//!
//! Serves a fixed item list in pages. Used by tests and for offline demos;
//! it is never substituted for the real backend when that one fails.

use super::types::{PageRequest, ResultPage, SearchFilters};
use super::SearchBackend;
use crate::error::{Error, Result};
use crate::types::FeedbackResult;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

type FilterFn<T> = Box<dyn Fn(&T, &SearchFilters) -> bool + Send + Sync>;

/// Paged backend over an in-memory list
pub struct FixtureBackend<T> {
    items: Vec<T>,
    filter: Option<FilterFn<T>>,
    latency: Option<Duration>,
    requests: Mutex<Vec<PageRequest>>,
}

impl<T: Clone> FixtureBackend<T> {
    /// Create a backend serving `items`
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            filter: None,
            latency: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Only serve items accepted by `filter`
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&T, &SearchFilters) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Delay every response
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Slice out the requested page
    pub fn page(&self, request: &PageRequest) -> Result<ResultPage<T>> {
        if request.page == 0 || request.limit == 0 {
            return Err(Error::http_status(
                400,
                format!(
                    "invalid page request: page={} limit={}",
                    request.page, request.limit
                ),
            ));
        }

        let matching: Vec<&T> = self
            .items
            .iter()
            .filter(|item| {
                self.filter
                    .as_ref()
                    .map_or(true, |f| f(item, &request.filters))
            })
            .collect();

        let total = matching.len();
        let start = request.offset().min(total);
        let end = (start + request.limit as usize).min(total);
        let results = matching[start..end].iter().map(|item| (*item).clone()).collect();

        Ok(ResultPage::new(results, total as u64, end < total))
    }
}

#[async_trait]
impl<T> SearchBackend for FixtureBackend<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch_page(&self, request: &PageRequest) -> Result<ResultPage<T>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.page(request)
    }
}

/// Fixture backend over `count` generated feedback results.
///
/// Recognised filters: `program`, `cohort`, `level`, `topic`, `executed`.
/// Unknown filter keys are ignored.
pub fn feedback_fixture_backend(count: usize) -> FixtureBackend<FeedbackResult> {
    FixtureBackend::new(FeedbackResult::fixtures(count)).with_filter(|item, filters| {
        filters.iter().all(|(key, value)| match key {
            "program" => item.program == value,
            "cohort" => item.cohort == value,
            "level" => item.level == value,
            "topic" => item.topic == value,
            "executed" => value.parse::<bool>().map_or(true, |v| item.executed == v),
            _ => true,
        })
    })
}
