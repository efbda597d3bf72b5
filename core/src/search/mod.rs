//! Web search client seam.
//!
//! The voice agent never talks to a search engine directly: every lookup goes
//! through [`SearchClient`], so the tool layer can be exercised against fakes
//! and the production [`TavilyClient`] can be swapped without touching it.

pub mod tavily;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use tavily::TavilyClient;

/// Provider-defined trade-off between thoroughness and latency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

/// A single outbound search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub search_depth: SearchDepth,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, search_depth: SearchDepth) -> Self {
        Self {
            query: query.into(),
            search_depth,
        }
    }
}

/// Search payload exactly as the provider returned it.
///
/// Nothing about its shape is enforced; the accessors only read well-known
/// fields for logging and tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct SearchResponse(pub Value);

impl SearchResponse {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn query(&self) -> Option<&str> {
        self.0.get("query").and_then(Value::as_str)
    }

    /// Number of entries in `results`, zero when absent
    pub fn result_count(&self) -> usize {
        self.0
            .get("results")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// `results[i].title`, if present
    pub fn title(&self, i: usize) -> Option<&str> {
        self.0
            .get("results")
            .and_then(|r| r.get(i))
            .and_then(|hit| hit.get("title"))
            .and_then(Value::as_str)
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search API rejected the credential: {0}")]
    Unauthorized(String),

    #[error("Search API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Search API error: status={status} body={body}")]
    Status { status: u16, body: String },

    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse search response: {0}")]
    Decode(String),
}

impl SearchError {
    /// Classify a non-success HTTP status the way the search providers report them
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => SearchError::Unauthorized(body),
            429 | 432 | 433 => SearchError::QuotaExceeded(body),
            _ => SearchError::Status { status, body },
        }
    }
}

/// Anything that can answer a web search
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError>;
}
