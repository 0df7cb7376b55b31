//! Search backend module
//!
//! The pager talks to the REST backend through the `SearchBackend` trait.
//!
//! # Overview
//!
//! - `SearchBackend` - fetches one page of results for a `PageRequest`
//! - `HttpSearchBackend` - GET (query string) or POST (JSON body) over `HttpClient`
//! - `FixtureBackend` - in-memory paged backend for tests and demos
//!
//! A backend does not need to handle cancellation itself: the pager drops
//! the `fetch_page` future of a superseded request, and dropping an HTTP
//! request future aborts the connection.

mod fixture;
mod rest;
mod types;

pub use fixture::{feedback_fixture_backend, FixtureBackend};
pub use rest::HttpSearchBackend;
pub use types::{PageRequest, ResultPage, SearchFilters};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of paged search results
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Type of a single result item
    type Item: Send + Sync + 'static;

    /// Fetch one page of results
    async fn fetch_page(&self, request: &PageRequest) -> Result<ResultPage<Self::Item>>;
}

#[async_trait]
impl<B: SearchBackend + ?Sized> SearchBackend for Arc<B> {
    type Item = B::Item;

    async fn fetch_page(&self, request: &PageRequest) -> Result<ResultPage<Self::Item>> {
        (**self).fetch_page(request).await
    }
}
