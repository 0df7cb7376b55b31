//! HTTP client module
//!
//! Provides the HTTP client used to talk to the REST backend.
//!
//! # Features
//!
//! - **Bearer Tokens**: Pulled from a `TokenSource` (usually the session manager)
//! - **Optional Retries**: Configurable retry logic with backoff, off by default
//! - **Error Mapping**: Non-2xx statuses and undecodable bodies become errors

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, TokenSource};

#[cfg(test)]
mod tests;
