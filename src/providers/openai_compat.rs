//! OpenAI-compatible provider
//!
//! Sutra exposes the OpenAI chat completions format, so one client serves both
//! reply strategies. Any other compatible endpoint works as well.
//!
//! # Configuration
//!
//! ```toml
//! [llm]
//! base_url = "https://api.two.ai/v2"
//! model = "sutra-v2"
//! max_tokens = 500
//! temperature = 0.7
//! ```

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conversation::Message;

use super::ProviderError;

pub const SUTRA_BASE_URL: &str = "https://api.two.ai/v2";
pub const SUTRA_MODEL: &str = "sutra-v2";

/// OpenAI-compatible chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Tool definition for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

/// Function definition for tool calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolDef {
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters: Some(parameters),
            },
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDef>>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallResponse>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ToolCallResponse {
    function: FunctionCallResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct FunctionCallResponse {
    name: String,
    arguments: String, // JSON string of arguments
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    /// Base URL for the API (e.g., https://api.two.ai/v2)
    pub base_url: String,
    /// Bearer token
    pub api_key: Option<String>,
    /// Model used when a call does not name one
    pub default_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for OpenAICompatConfig {
    fn default() -> Self {
        Self {
            base_url: SUTRA_BASE_URL.to_string(),
            api_key: None,
            default_model: SUTRA_MODEL.to_string(),
            timeout_secs: 30,
            max_tokens: Some(500),
            temperature: Some(0.7),
        }
    }
}

impl OpenAICompatConfig {
    /// Create config for the Sutra API
    pub fn sutra(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// OpenAI-compatible API provider
pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: Client,
}

impl OpenAICompatProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: OpenAICompatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Send a chat completion request
    pub async fn chat(&self, messages: &[Message], model: &str) -> Result<Message, ProviderError> {
        self.chat_with_tools(messages, model, None).await
    }

    /// Send a chat completion request with tools
    ///
    /// Native tool calls are rendered as fenced `tool_call` blocks in the
    /// returned assistant content.
    pub async fn chat_with_tools(
        &self,
        messages: &[Message],
        model: &str,
        tools: Option<Vec<ToolDef>>,
    ) -> Result<Message, ProviderError> {
        let request = ChatCompletionRequest {
            model: if model.is_empty() {
                self.config.default_model.clone()
            } else {
                model.to_string()
            },
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools,
        };

        let mut req_builder = self.client.post(self.config.completions_url());

        if let Some(ref api_key) = self.config.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Only 200 carries a completion; other 2xx codes are errors too
        if status != StatusCode::OK {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {} - Body: {}", e, body))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        if let Some(tool_calls) = choice.message.tool_calls.filter(|calls| !calls.is_empty()) {
            let tool_calls_str = tool_calls
                .iter()
                .map(|tc| {
                    format!(
                        "```tool_call\n{{\n  \"name\": \"{}\",\n  \"arguments\": {}\n}}\n```",
                        tc.function.name, tc.function.arguments
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");

            return Ok(Message::assistant(tool_calls_str));
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::InvalidResponse("No content in response".to_string()))?;

        Ok(Message::assistant(content))
    }
}
