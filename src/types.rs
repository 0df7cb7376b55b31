//! Common types used throughout the LMS client
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method used to reach the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    /// Filters, page and limit travel in the query string
    #[default]
    GET,
    /// Filters, page and limit travel in a JSON body
    POST,
}

impl From<RequestMethod> for reqwest::Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::GET => reqwest::Method::GET,
            RequestMethod::POST => reqwest::Method::POST,
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Feedback Results
// ============================================================================

/// One row of the feedback search results list.
///
/// The pager itself is generic over its item type; this is the shape the
/// feedback results view asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResult {
    /// Program name
    pub program: String,
    /// Cohort identifier
    pub cohort: String,
    /// Level identifier
    pub level: String,
    /// Topic within the level
    pub topic: String,
    /// Activity name
    #[serde(alias = "activity_name")]
    pub activity_name: String,
    /// Whether the activity was executed
    #[serde(default)]
    pub executed: bool,
}

const FIXTURE_PROGRAMS: [&str; 3] = ["Data Science", "Web Development", "Cloud Engineering"];
const FIXTURE_LEVELS: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];
const FIXTURE_TOPICS: [&str; 4] = ["Fundamentals", "Practice Lab", "Project", "Review"];

impl FeedbackResult {
    /// Generate `count` deterministic demo records.
    ///
    /// Meant for tests and demos against `FixtureBackend`, not as a stand-in
    /// when the real backend is unreachable.
    pub fn fixtures(count: usize) -> Vec<Self> {
        (0..count)
            .map(|i| Self {
                program: FIXTURE_PROGRAMS[i % FIXTURE_PROGRAMS.len()].to_string(),
                cohort: format!("C{}", i % 4 + 1),
                level: FIXTURE_LEVELS[(i / 4) % FIXTURE_LEVELS.len()].to_string(),
                topic: FIXTURE_TOPICS[i % FIXTURE_TOPICS.len()].to_string(),
                activity_name: format!("Activity {}", i + 1),
                executed: i % 3 != 0,
            })
            .collect()
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
