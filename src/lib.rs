// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # LMS Client
//!
//! Client-side core of a learning-management results browser: a filtered,
//! incrementally loaded result list over a REST backend, plus the auth
//! session that backend needs.
//!
//! ## Features
//!
//! - **Result pager**: page-by-page accumulation with a single live request;
//!   superseded responses are cancelled and never applied
//! - **Pluggable backend**: `SearchBackend` trait with a REST implementation
//!   and an in-memory fixture backend
//! - **Session store**: persisted bearer token with remote validation and
//!   best-effort logout
//! - **HTTP client**: base URL joining, bearer injection, optional retries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lms_client::{ClientConfig, HttpClient, HttpSearchBackend, ResultPager, SearchFilters};
//!
//! #[tokio::main]
//! async fn main() -> lms_client::Result<()> {
//!     let config = ClientConfig::new("https://lms.example.com");
//!     let client = HttpClient::with_config(config.http_config())?;
//!     let backend: HttpSearchBackend<lms_client::FeedbackResult> =
//!         HttpSearchBackend::from_config(client, &config);
//!
//!     let pager = ResultPager::with_page_size(backend, config.page_size);
//!     pager.search(SearchFilters::new().with("cohort", "C1")).await?;
//!     while let Some(next) = pager.load_more() {
//!         next.await?;
//!     }
//!     println!("{} results", pager.snapshot().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ResultPager                           │
//! │  search(filters)   load_more()   reset()   subscribe()       │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ SearchBackend::fetch_page
//!            ┌───────────────────┴───────────────────┐
//!   ┌────────┴─────────┐                   ┌─────────┴────────┐
//!   │ HttpSearchBackend│                   │  FixtureBackend  │
//!   └────────┬─────────┘                   └──────────────────┘
//!            │ HttpClient ◄── TokenSource ── SessionManager
//!            │                                 │        │
//!            ▼                              TokenStore AuthApi
//!       REST backend
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// HTTP client with retry and bearer tokens
pub mod http;

/// Search backends
pub mod backend;

/// Incremental result loading
pub mod pager;

/// Auth session store
pub mod session;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use backend::{
    FixtureBackend, HttpSearchBackend, PageRequest, ResultPage, SearchBackend, SearchFilters,
};
pub use config::ClientConfig;
pub use http::{HttpClient, HttpClientConfig, TokenSource};
pub use pager::{PagerPhase, PagerState, ResultPager};
pub use session::{Session, SessionManager, UserIdentity};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
