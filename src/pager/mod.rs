//! Result pager module
//!
//! Filtered, page-by-page loading of search results with at most one live
//! request per pager.
//!
//! # Overview
//!
//! - `ResultPager` - `search`, `load_more`, `reset`; cancels superseded requests
//! - `PagerState` - accumulated results plus `total`, `has_more`, `loading`, `error`
//! - `PagerPhase` - `Idle → Searching → {Ready, Failed}`, `Ready ⇄ LoadingMore`
//!
//! A failed first page clears the list; a failed later page keeps every
//! page loaded so far.

mod coordinator;
mod state;

pub use coordinator::ResultPager;
pub use state::{PagerPhase, PagerState, REQUEST_FAILED_MESSAGE};
