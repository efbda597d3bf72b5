use crate::config::SearchConfig;
use crate::search::{SearchClient, SearchDepth, SearchError, SearchRequest, SearchResponse};
use crate::tools::{Tool, ToolError, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const WEB_SEARCH_TOOL_NAME: &str = "search_web";

/// Web search tool exposed to the language model.
///
/// Each call performs exactly one advanced-depth search. Failures are returned
/// as-is: there is no retry and no canned fallback answer, the orchestrator
/// decides what to tell the user.
pub struct WebSearchTool {
    client: Arc<dyn SearchClient>,
    delay: Option<Duration>,
}

impl WebSearchTool {
    pub fn new(client: Arc<dyn SearchClient>, config: &SearchConfig) -> Self {
        Self {
            client,
            delay: config.delay,
        }
    }

    /// Search for `query` and hand back the provider's response untouched.
    ///
    /// The query is not validated; an empty string goes to the provider as is.
    pub async fn invoke(&self, query: &str) -> Result<SearchResponse, SearchError> {
        info!(target: "web_search", query = %query, "Search agent thinking...");

        let response = self
            .client
            .search(SearchRequest::new(query, SearchDepth::Advanced))
            .await?;

        debug!(target: "web_search", response = ?response, "Raw search response");

        if let Some(delay) = self.delay {
            info!(target: "web_search", delay_secs = delay.as_secs(), "Search finished, simulating delay");
            tokio::time::sleep(delay).await;
        } else {
            info!(target: "web_search", result_count = response.result_count(), "Search finished");
        }

        Ok(response)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> String {
        WEB_SEARCH_TOOL_NAME.to_string()
    }

    fn description(&self) -> String {
        "Search the web for information based on the given query. \
         Always use this function whenever the user requests a web search."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to look up on the web."
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query'".to_string()))?;

        let response = self.invoke(query).await?;
        Ok(response.into_value())
    }
}
