//! DuckDuckGo instant-answer search

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{Tool, ToolDefinition, ToolError, ToolResult};

pub const DUCKDUCKGO_BASE_URL: &str = "https://api.duckduckgo.com";

const MAX_RESULTS: usize = 5;

pub struct WebSearchTool {
    client: Client,
    base_url: String,
}

impl WebSearchTool {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        // No key required
        let resp: Value = self
            .client
            .get(format!("{}/", self.base_url.trim_end_matches('/')))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut results = Vec::new();

        if let Some(text) = resp["AbstractText"].as_str().filter(|t| !t.is_empty()) {
            results.push(text.to_string());
        }

        if let Some(related) = resp["RelatedTopics"].as_array() {
            results.extend(
                related
                    .iter()
                    .filter_map(|item| item["Text"].as_str())
                    .filter(|text| !text.is_empty())
                    .map(str::to_string),
            );
        }

        results.truncate(MAX_RESULTS);
        Ok(results)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "web_search",
            "Search the web for current facts, news or anything you are unsure about",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to search for" }
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let query = params["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidParameters("query is required".to_string()))?;

        tracing::debug!(query, "web search");
        let results = self.search(query).await?;

        if results.is_empty() {
            return Ok(ToolResult::success(json!({ "query": query, "results": [], "note": "no results" })));
        }
        Ok(ToolResult::success(json!({ "query": query, "results": results })))
    }
}
