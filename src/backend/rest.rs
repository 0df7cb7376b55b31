//! REST implementation of `SearchBackend`

use super::types::{PageRequest, ResultPage};
use super::SearchBackend;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::RequestMethod;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;

/// Search backend reached over HTTP/JSON
pub struct HttpSearchBackend<T> {
    client: HttpClient,
    path: String,
    method: RequestMethod,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpSearchBackend<T> {
    /// Create a backend that GETs `path`
    pub fn new(client: HttpClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            method: RequestMethod::GET,
            _item: PhantomData,
        }
    }

    /// Create a backend from the client config
    pub fn from_config(client: HttpClient, config: &ClientConfig) -> Self {
        Self::new(client, config.search_path.clone()).with_method(config.search_method)
    }

    /// Set how the request is sent
    #[must_use]
    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    /// Endpoint path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request method
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    fn request_config(&self, request: &PageRequest) -> RequestConfig {
        match self.method {
            RequestMethod::GET => RequestConfig {
                query: request.query_params(),
                ..RequestConfig::default()
            },
            RequestMethod::POST => RequestConfig::new().json(request.to_json()),
        }
    }
}

impl<T> std::fmt::Debug for HttpSearchBackend<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchBackend")
            .field("path", &self.path)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> SearchBackend for HttpSearchBackend<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch_page(&self, request: &PageRequest) -> Result<ResultPage<T>> {
        debug!(
            "Fetching page {} (limit {}) from {}",
            request.page, request.limit, self.path
        );
        self.client
            .request_json(
                self.method.into(),
                &self.path,
                self.request_config(request),
            )
            .await
    }
}
