//! Request and response types for the search endpoint
//!
//! Request: `{ ...filters, page, limit }`.
//! Response: `{ results: T[], total, hasMore }`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Query parameter carrying the 1-based page number
pub const PAGE_PARAM: &str = "page";
/// Query parameter carrying the page size
pub const LIMIT_PARAM: &str = "limit";

/// Filters passed through to the backend unmodified.
///
/// Keys are kept sorted so requests are reproducible. A filter named `page`
/// or `limit` is shadowed by the pager's own values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchFilters(BTreeMap<String, String>);

impl SearchFilters {
    /// Create an empty filter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a filter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Parse a `key=value` pair
    pub fn parse_pair(pair: &str) -> Result<(String, String)> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| {
                Error::invalid_value("filter", format!("expected key=value, got '{pair}'"))
            })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::invalid_value("filter", format!("empty key in '{pair}'")));
        }
        Ok((key.to_string(), value.trim().to_string()))
    }

    /// Look up a filter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check if no filters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over filters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchFilters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One page request sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Filters for the query session
    pub filters: SearchFilters,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl PageRequest {
    /// Create a page request
    pub fn new(filters: SearchFilters, page: u32, limit: u32) -> Self {
        Self {
            filters,
            page,
            limit,
        }
    }

    /// Zero-based index of the first item on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }

    /// Query-string form: filters, then `page` and `limit`
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .filter(|(k, _)| *k != PAGE_PARAM && *k != LIMIT_PARAM)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain([
                (PAGE_PARAM.to_string(), self.page.to_string()),
                (LIMIT_PARAM.to_string(), self.limit.to_string()),
            ])
            .collect()
    }

    /// JSON body form: filters as strings, `page` and `limit` as numbers
    pub fn to_json(&self) -> Value {
        let mut body: Map<String, Value> = self
            .filters
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        body.insert(PAGE_PARAM.to_string(), Value::from(self.page));
        body.insert(LIMIT_PARAM.to_string(), Value::from(self.limit));
        Value::Object(body)
    }
}

/// One page of results as reported by the backend.
///
/// All three fields are required; a success reply without them is a
/// decode failure, not an empty page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<T> {
    /// Items on this page, in backend order
    pub results: Vec<T>,
    /// Count of all matching items server-side
    pub total: u64,
    /// Whether another page exists
    #[serde(alias = "has_more")]
    pub has_more: bool,
}

impl<T> ResultPage<T> {
    /// Create a page
    pub fn new(results: Vec<T>, total: u64, has_more: bool) -> Self {
        Self {
            results,
            total,
            has_more,
        }
    }

    /// An empty last page
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, false)
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if the page has no items
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
