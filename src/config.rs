//! Client configuration
//!
//! `ClientConfig` describes how to reach the REST backend. It can be loaded
//! from a YAML or JSON file, overridden from the environment, and validated
//! before anything is built from it.

use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::types::{OptionStringExt, RequestMethod};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Environment variable overriding `baseUrl`
pub const ENV_BASE_URL: &str = "LMS_BASE_URL";
/// Environment variable overriding `pageSize`
pub const ENV_PAGE_SIZE: &str = "LMS_PAGE_SIZE";
/// Environment variable overriding `sessionFile`
pub const ENV_SESSION_FILE: &str = "LMS_SESSION_FILE";

/// Configuration for the LMS client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the REST backend
    #[serde(alias = "base_url", default)]
    pub base_url: String,

    /// Number of items requested per page
    #[serde(alias = "page_size", default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds
    #[serde(alias = "timeout_secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for retryable failures
    #[serde(alias = "max_retries", default)]
    pub max_retries: u32,

    /// Path of the search endpoint
    #[serde(alias = "search_path", default = "default_search_path")]
    pub search_path: String,

    /// How filters are sent to the search endpoint
    #[serde(alias = "search_method", default)]
    pub search_method: RequestMethod,

    /// Where the session token is persisted
    #[serde(alias = "session_file", default)]
    pub session_file: Option<PathBuf>,

    /// Re-validate a persisted session against the backend on startup
    #[serde(alias = "validate_session", default = "default_true")]
    pub validate_session: bool,

    /// Session validation endpoint
    #[serde(alias = "me_path", default = "default_me_path")]
    pub me_path: String,

    /// Remote logout endpoint
    #[serde(alias = "logout_path", default = "default_logout_path")]
    pub logout_path: String,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_search_path() -> String {
    "/feedback/results".to_string()
}

fn default_true() -> bool {
    true
}

fn default_me_path() -> String {
    "/auth/me".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            search_path: default_search_path(),
            search_method: RequestMethod::default(),
            session_file: None,
            validate_session: true,
            me_path: default_me_path(),
            logout_path: default_logout_path(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at `base_url` with defaults elsewhere
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the session file
    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Parse a config from YAML (JSON is accepted too)
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Load a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).none_if_empty() {
            self.base_url = base_url;
        }

        if let Some(page_size) = lookup(ENV_PAGE_SIZE).none_if_empty() {
            self.page_size = page_size.trim().parse().map_err(|_| {
                Error::invalid_value("pageSize", format!("'{page_size}' is not a number"))
            })?;
        }

        if let Some(session_file) = lookup(ENV_SESSION_FILE).none_if_empty() {
            self.session_file = Some(PathBuf::from(session_file));
        }

        Ok(())
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("baseUrl"));
        }
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "baseUrl",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("pageSize", "must be greater than zero"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value(
                "timeoutSecs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the HTTP client config for this backend
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(self.timeout())
            .max_retries(self.max_retries)
            .build()
    }
}
