//! Result pager: incremental loading with a single live request
//!
//! Every `search`, `load_more` and `reset` bumps a generation counter and
//! cancels the previous request's token. A request task races its fetch
//! against that token and, when the fetch does finish, applies the outcome
//! only if its generation is still the current one. Both the check and the
//! state mutation happen under the control lock, so a superseded response
//! can never reach the state.

use super::state::{PagerState, REQUEST_FAILED_MESSAGE};
use crate::backend::{PageRequest, ResultPage, SearchBackend, SearchFilters};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{Error, Result};
use futures::Stream;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Search,
    LoadMore,
}

#[derive(Debug, Default)]
struct Control {
    generation: u64,
    in_flight: Option<CancellationToken>,
    filters: SearchFilters,
}

impl Control {
    /// Invalidate the live request, if any, and open a new generation
    fn supersede(&mut self) -> u64 {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

struct Shared<B: SearchBackend> {
    backend: B,
    page_size: u32,
    control: Mutex<Control>,
    state: watch::Sender<PagerState<B::Item>>,
}

impl<B: SearchBackend> Shared<B> {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(
        &self,
        kind: RequestKind,
        generation: u64,
        page_number: u32,
        outcome: Result<ResultPage<B::Item>>,
    ) {
        let mut control = self.control();
        if control.generation != generation {
            debug!(
                "Discarding stale {:?} response for page {} (generation {}, current {})",
                kind, page_number, generation, control.generation
            );
            return;
        }
        control.in_flight = None;

        match outcome {
            Ok(page) => {
                debug!(
                    "Applying {:?} page {}: {} items, total {}, has_more {}",
                    kind,
                    page_number,
                    page.len(),
                    page.total,
                    page.has_more
                );
                self.state.send_modify(|state| match kind {
                    RequestKind::Search => state.finish_search(page),
                    RequestKind::LoadMore => state.finish_load_more(page_number, page),
                });
            }
            Err(e) if e.is_cancelled() => {
                debug!("{:?} request for page {} cancelled", kind, page_number);
            }
            Err(e) => {
                warn!("{:?} request for page {} failed: {}", kind, page_number, e);
                self.state.send_modify(|state| match kind {
                    RequestKind::Search => state.fail_search(REQUEST_FAILED_MESSAGE),
                    RequestKind::LoadMore => state.fail_load_more(REQUEST_FAILED_MESSAGE),
                });
            }
        }
    }
}

/// Incremental, filtered result loading against a `SearchBackend`.
///
/// Must be used inside a tokio runtime. Dropping the pager cancels any
/// outstanding request.
pub struct ResultPager<B: SearchBackend> {
    shared: Arc<Shared<B>>,
}

impl<B: SearchBackend + 'static> ResultPager<B> {
    /// Create a pager with the default page size
    pub fn new(backend: B) -> Self {
        Self::with_page_size(backend, DEFAULT_PAGE_SIZE)
    }

    /// Create a pager with a custom page size (at least 1)
    pub fn with_page_size(backend: B, page_size: u32) -> Self {
        let (state, _) = watch::channel(PagerState::new());
        Self {
            shared: Arc::new(Shared {
                backend,
                page_size: page_size.max(1),
                control: Mutex::new(Control::default()),
                state,
            }),
        }
    }

    /// Page size sent as `limit`
    pub fn page_size(&self) -> u32 {
        self.shared.page_size
    }

    /// The backend this pager reads from
    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// Filters of the current query session
    pub fn filters(&self) -> SearchFilters {
        self.shared.control().filters.clone()
    }

    /// Start a new query session from page 1.
    ///
    /// Returns immediately; the handle resolves once the response has been
    /// applied or discarded.
    pub fn search(&self, filters: SearchFilters) -> JoinHandle<()> {
        let mut control = self.shared.control();
        let generation = control.supersede();
        control.filters = filters.clone();

        self.shared.state.send_modify(PagerState::begin_search);

        let request = PageRequest::new(filters, 1, self.shared.page_size);
        debug!("Searching (generation {}): {:?}", generation, request);
        self.spawn_request(&mut control, RequestKind::Search, generation, request)
    }

    /// Fetch the next page of the current session.
    ///
    /// Returns `None` without issuing a request while a request is in flight
    /// or when the backend reported no further pages.
    pub fn load_more(&self) -> Option<JoinHandle<()>> {
        let mut control = self.shared.control();
        if !self.shared.state.borrow().can_load_more() {
            debug!("load_more ignored: loading or no more pages");
            return None;
        }

        let generation = control.supersede();
        let mut next_page = 0;
        self.shared.state.send_modify(|state| {
            next_page = state.begin_load_more();
        });

        let request = PageRequest::new(control.filters.clone(), next_page, self.shared.page_size);
        debug!("Loading page {} (generation {})", next_page, generation);
        Some(self.spawn_request(&mut control, RequestKind::LoadMore, generation, request))
    }

    /// Cancel any request and return to the initial state
    pub fn reset(&self) {
        let mut control = self.shared.control();
        control.supersede();
        control.filters = SearchFilters::default();
        self.shared.state.send_modify(PagerState::clear);
    }

    /// Cancel any request and drop the pager
    pub fn dispose(self) {
        drop(self);
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<PagerState<B::Item>> {
        self.shared.state.subscribe()
    }

    /// Whether a request is in flight
    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    /// Whether the backend reported another page
    pub fn has_more(&self) -> bool {
        self.shared.state.borrow().has_more
    }

    fn spawn_request(
        &self,
        control: &mut Control,
        kind: RequestKind,
        generation: u64,
        request: PageRequest,
    ) -> JoinHandle<()> {
        let token = CancellationToken::new();
        control.in_flight = Some(token.clone());

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => Err(Error::Cancelled),
                result = shared.backend.fetch_page(&request) => result,
            };
            shared.complete(kind, generation, request.page, outcome);
        })
    }
}

impl<B> ResultPager<B>
where
    B: SearchBackend + 'static,
    B::Item: Clone,
{
    /// Copy of the current state
    pub fn snapshot(&self) -> PagerState<B::Item> {
        self.shared.state.borrow().clone()
    }

    /// Stream of states, one per observed change.
    ///
    /// Rapid successive changes may be coalesced into the latest state.
    pub fn updates(&self) -> impl Stream<Item = PagerState<B::Item>> {
        futures::stream::unfold(self.subscribe(), |mut rx| async move {
            rx.changed().await.ok()?;
            let state = rx.borrow_and_update().clone();
            Some((state, rx))
        })
    }
}

impl<B: SearchBackend> Drop for ResultPager<B> {
    fn drop(&mut self) {
        let mut control = self.shared.control.lock().unwrap_or_else(PoisonError::into_inner);
        control.supersede();
    }
}

impl<B: SearchBackend> std::fmt::Debug for ResultPager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let control = self.shared.control();
        f.debug_struct("ResultPager")
            .field("page_size", &self.shared.page_size)
            .field("generation", &control.generation)
            .field("in_flight", &control.in_flight.is_some())
            .field("filters", &control.filters)
            .finish_non_exhaustive()
    }
}
