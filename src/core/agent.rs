//! Agent reply strategy with tool calling
//!
//! The agent sends the persona instructions and the turn prompt to the model
//! along with the registered tools. When the model asks for a tool, the tool
//! runs and its result is fed back; the first plain answer is the reply.
//! Any failure hands the turn to the next strategy.

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::prompts::agent_prompt;
use crate::config::Persona;
use crate::conversation::Message;
use crate::providers::{OpenAICompatProvider, ToolDef};
use crate::tools::{ToolRegistry, ToolResult};

use super::reply::{Reply, ReplyError, ReplyRequest, ReplyStrategy};

/// Maximum number of model calls per turn to prevent tool loops
const MAX_TOOL_ITERATIONS: usize = 5;

/// A tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

pub struct AgentStrategy {
    provider: Arc<OpenAICompatProvider>,
    persona: Persona,
    tools: Arc<ToolRegistry>,
}

impl AgentStrategy {
    pub fn new(provider: Arc<OpenAICompatProvider>, persona: Persona, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            persona,
            tools,
        }
    }

    fn tool_defs(&self) -> Option<Vec<ToolDef>> {
        if self.tools.is_empty() {
            return None;
        }
        Some(self.tools.all_tools().iter().map(|t| t.to_tool_def()).collect())
    }
}

#[async_trait]
impl ReplyStrategy for AgentStrategy {
    fn name(&self) -> &'static str {
        "agent"
    }

    async fn generate(&self, request: &ReplyRequest<'_>) -> Result<Reply, ReplyError> {
        let mut messages = vec![
            Message::system(
                self.persona
                    .agent_instructions(!self.tools.is_empty(), Local::now()),
            ),
            Message::user(agent_prompt(request.language, request.context, request.message)),
        ];
        let tool_defs = self.tool_defs();

        for iteration in 1..=MAX_TOOL_ITERATIONS {
            let response = self
                .provider
                .chat_with_tools(&messages, "", tool_defs.clone())
                .await?;

            if let Some(tool_calls) = extract_tool_calls(&response.content) {
                tracing::debug!(iteration, calls = tool_calls.len(), "agent requested tools");

                for tool_call in tool_calls {
                    let tool_result = match self
                        .tools
                        .execute(&tool_call.name, tool_call.arguments.clone())
                        .await
                    {
                        Ok(r) => r,
                        Err(e) => ToolResult::failure(e.to_string()),
                    };

                    messages.push(Message::assistant(format!(
                        "Tool call: {} with arguments: {}",
                        tool_call.name,
                        serde_json::to_string_pretty(&tool_call.arguments).unwrap_or_default()
                    )));

                    messages.push(Message::system(format!(
                        "Tool result for {}: {}",
                        tool_call.name,
                        serde_json::to_string_pretty(&tool_result).unwrap_or_default()
                    )));
                }

                continue;
            }

            if response.content.trim().is_empty() {
                return Err(ReplyError::EmptyReply);
            }
            return Ok(Reply::Generated(response.content));
        }

        Err(ReplyError::MaxIterationsExceeded)
    }
}

/// Extract fenced `tool_call` blocks from a model response
pub fn extract_tool_calls(content: &str) -> Option<Vec<ToolCall>> {
    let mut calls = Vec::new();

    for block in content.split("```tool_call").skip(1) {
        if let Some(end) = block.find("```") {
            let json_str = block[..end].trim();
            if let Ok(call) = serde_json::from_str::<Value>(json_str) {
                if let (Some(name), Some(arguments)) = (
                    call.get("name").and_then(|n| n.as_str()),
                    call.get("arguments"),
                ) {
                    calls.push(ToolCall {
                        name: name.to_string(),
                        arguments: arguments.clone(),
                    });
                }
            }
        }
    }

    if calls.is_empty() {
        None
    } else {
        Some(calls)
    }
}
