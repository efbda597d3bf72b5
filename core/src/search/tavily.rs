use super::{SearchClient, SearchError, SearchRequest, SearchResponse};
use crate::config::{ConfigError, SearchConfig};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

/// Tavily Search API client
pub struct TavilyClient {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TavilyClient {
    /// Build a client from config. Fails immediately when no API key is set.
    ///
    /// No request timeout is applied; deadlines are left to the HTTP stack.
    pub fn new(config: &SearchConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();

        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        tracing::info!(target: "tavily", base_url = %config.base_url, "Tavily search client configured");

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            http_client,
        })
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        debug!(target: "tavily", query = %request.query, depth = %request.search_depth.as_str(), "Performing Tavily search");

        let url = format!("{}/search", self.base_url);
        let body = json!({
            "query": request.query,
            "search_depth": request.search_depth,
        });

        let resp = self
            .http_client
            .post(&url)
            .header("Accept", "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(target: "tavily", error = %e, "Request failed");
                SearchError::Request(e)
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::from_status(status, body));
        }

        let data: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        debug!(target: "tavily", result_count = %data.result_count(), "Search completed");
        Ok(data)
    }
}
