//! Pager state and its transitions
//!
//! `PagerState` is what observers see. The transition methods are only
//! called by `ResultPager` while it holds its control lock.

use crate::backend::ResultPage;

/// Generic message shown for any failed request
pub const REQUEST_FAILED_MESSAGE: &str = "Failed to load results. Please try again.";

/// Where the current query session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagerPhase {
    /// No search issued yet, or reset
    #[default]
    Idle,
    /// First page in flight
    Searching,
    /// Results loaded; `error` may hold a failed load-more
    Ready,
    /// Next page in flight
    LoadingMore,
    /// First page failed; only a new search recovers
    Failed,
}

/// Observable state of a result pager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerState<T> {
    /// Accumulated items in insertion order
    pub results: Vec<T>,
    /// Total matching items reported by the backend
    pub total: u64,
    /// Whether the backend reported another page
    pub has_more: bool,
    /// Whether a request is in flight
    pub loading: bool,
    /// User-facing error message
    pub error: Option<String>,
    /// Last page applied, starting at 1
    pub current_page: u32,
    /// Session phase
    pub phase: PagerPhase,
}

impl<T> Default for PagerState<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            total: 0,
            has_more: false,
            loading: false,
            error: None,
            current_page: 1,
            phase: PagerPhase::Idle,
        }
    }
}

impl<T> PagerState<T> {
    /// Create the initial state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `load_more` would issue a request
    pub fn can_load_more(&self) -> bool {
        !self.loading && self.has_more
    }

    /// Number of accumulated items
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if nothing is accumulated
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub(crate) fn begin_search(&mut self) {
        self.loading = true;
        self.error = None;
        self.current_page = 1;
        self.phase = PagerPhase::Searching;
    }

    pub(crate) fn finish_search(&mut self, page: ResultPage<T>) {
        self.results = page.results;
        self.total = page.total;
        self.has_more = page.has_more;
        self.current_page = 1;
        self.loading = false;
        self.phase = PagerPhase::Ready;
    }

    pub(crate) fn fail_search(&mut self, message: impl Into<String>) {
        self.results.clear();
        self.total = 0;
        self.has_more = false;
        self.current_page = 1;
        self.loading = false;
        self.error = Some(message.into());
        self.phase = PagerPhase::Failed;
    }

    /// Returns the page number to fetch next
    pub(crate) fn begin_load_more(&mut self) -> u32 {
        self.loading = true;
        self.error = None;
        self.phase = PagerPhase::LoadingMore;
        self.current_page + 1
    }

    pub(crate) fn finish_load_more(&mut self, page_number: u32, page: ResultPage<T>) {
        self.results.extend(page.results);
        self.total = page.total;
        self.has_more = page.has_more;
        self.current_page = page_number;
        self.loading = false;
        self.phase = PagerPhase::Ready;
    }

    /// Earlier pages stay.
    pub(crate) fn fail_load_more(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
        self.phase = PagerPhase::Ready;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
