//! Tools the agent can call before answering
//!
//! A tool exposes a JSON-schema definition to the model and executes with the
//! JSON arguments the model sends back.
//!
//! # Built-in Tools
//!
//! - `web_search` - DuckDuckGo instant answers

pub mod web_search;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::providers::ToolDef;

pub use web_search::WebSearchTool;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Definition of a tool that the model can call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "web_search")
    pub name: String,

    /// Human-readable description for the model to understand when to use this tool
    pub description: String,

    /// JSON Schema defining the expected parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    /// Set the parameters schema for this tool
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Function-calling form sent to the completions API
    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::function(&self.name, &self.description, self.parameters.clone())
    }
}

/// Result of executing a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution was successful
    pub success: bool,

    /// The output/result of the tool execution
    pub output: Value,

    /// Optional error message if execution failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(output: impl Into<Value>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError>;
}

/// Tools available to the agent, keyed by name
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.definition().name;
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn all_tools(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub async fn execute(&self, name: &str, params: Value) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        tool.execute(params).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("echo", "Echoes its input")
        }

        async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::success(params))
        }
    }

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("my_tool", "Does something");
        assert_eq!(tool.name, "my_tool");
        assert_eq!(tool.description, "Does something");

        let def = tool.to_tool_def();
        assert_eq!(def.tool_type, "function");
        assert_eq!(def.function.name, "my_tool");
    }

    #[test]
    fn test_tool_result() {
        let success = ToolResult::success("output");
        assert!(success.success);
        assert!(success.error.is_none());

        let failure = ToolResult::failure("something went wrong");
        assert!(!failure.success);
        assert!(failure.error.is_some());
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        assert_eq!(registry.len(), 1);

        let result = registry
            .execute("echo", serde_json::json!({ "x": 1 }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output["x"], 1);

        let missing = registry.execute("nope", Value::Null).await;
        assert!(matches!(missing, Err(ToolError::ToolNotFound(_))));
    }
}
