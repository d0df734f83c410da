//! Turn orchestration
//!
//! One chat turn:
//! 1. Fetch fresh memory context for the user
//! 2. Ask each reply strategy in order until one answers
//! 3. Save the turn to memory if the reply came from the model
//! 4. Append the user message and the reply to the session
//!
//! A turn always produces text. Failures along the way degrade the reply or
//! skip memory, they never abort the turn.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, Persona};
use crate::conversation::SessionContext;
use crate::providers::{OpenAICompatConfig, OpenAICompatProvider, ProviderError};
use crate::tools::{ToolRegistry, WebSearchTool};

use super::agent::AgentStrategy;
use super::memory::{Mem0Client, MemoryGateway};
use super::reply::{DirectStrategy, Reply, ReplyRequest, ReplyStrategy};
use super::translate::{GoogleTranslator, TranslatorAdapter};

/// Reply used when every strategy failed
pub const NO_REPLY_MESSAGE: &str = "⚠️ Unexpected error: no reply strategy succeeded";

/// Shown while no model API key is configured
pub const API_KEY_REQUIRED: &str =
    "API key required. Set SUTRA_API_KEY to start chatting with Sutra.";

/// Errors from building the orchestrator
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Model API key is not configured")]
    MissingApiKey,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub struct TurnOrchestrator {
    memory: MemoryGateway,
    strategies: Vec<Arc<dyn ReplyStrategy>>,
}

impl TurnOrchestrator {
    pub fn new(memory: MemoryGateway, strategies: Vec<Arc<dyn ReplyStrategy>>) -> Self {
        Self { memory, strategies }
    }

    /// Resolve the available capabilities once from configuration.
    ///
    /// Only a missing model key is fatal; memory, translation and the agent
    /// each fall back to a no-op or are left out.
    pub async fn from_config(config: &Config) -> Result<Self, ChatError> {
        let api_key = config.sutra_api_key.clone().ok_or(ChatError::MissingApiKey)?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let persona = match config.persona_file {
            Some(ref path) => match Persona::load_from_file(path).await {
                Ok(persona) => {
                    tracing::info!(persona = %persona.name, path = %path.display(), "loaded persona");
                    persona
                }
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "persona file unusable, using built-in persona");
                    Persona::builtin()
                }
            },
            None => Persona::builtin(),
        };

        let llm_config = OpenAICompatConfig {
            base_url: config.sutra_base_url.clone(),
            api_key: Some(api_key),
            default_model: config.sutra_model.clone(),
            timeout_secs: config.request_timeout_secs,
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        };

        let mut strategies: Vec<Arc<dyn ReplyStrategy>> = Vec::new();

        if config.agent_enabled {
            let agent_config = OpenAICompatConfig {
                max_tokens: None,
                ..llm_config.clone()
            };
            match OpenAICompatProvider::new(agent_config) {
                Ok(provider) => {
                    let tools = Arc::new(build_tools(config, timeout));
                    tracing::info!(tools = tools.len(), "agent strategy enabled");
                    strategies.push(Arc::new(AgentStrategy::new(
                        Arc::new(provider),
                        persona.clone(),
                        tools,
                    )));
                }
                Err(e) => tracing::warn!(error = %e, "agent unavailable, using direct calls only"),
            }
        }

        let direct = OpenAICompatProvider::new(llm_config)?;
        strategies.push(Arc::new(DirectStrategy::new(Arc::new(direct), persona)));

        let memory = build_memory(config, timeout);
        tracing::info!(
            memory = memory.is_enabled(),
            translator = memory.translator().is_enabled(),
            "memory capabilities resolved"
        );

        Ok(Self::new(memory, strategies))
    }

    pub fn memory(&self) -> &MemoryGateway {
        &self.memory
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run one chat turn and return the reply text
    pub async fn handle_turn(&self, session: &mut SessionContext, message: &str) -> String {
        tracing::debug!(session = %session.id, "fetching memory context");
        let context = self.memory.fetch_context(&session.user_id).await;

        let request = ReplyRequest {
            message,
            context: &context,
            language: session.language,
        };

        let text = match self.generate(&request).await {
            Reply::Generated(text) => {
                tracing::debug!(session = %session.id, "persisting turn to memory");
                self.memory
                    .record_turn(&session.user_id, session.language, message, &text)
                    .await;
                text
            }
            Reply::Degraded(text) => text,
        };

        session.add_user(message);
        session.add_assistant(&text);
        text
    }

    async fn generate(&self, request: &ReplyRequest<'_>) -> Reply {
        for strategy in &self.strategies {
            tracing::debug!(strategy = strategy.name(), "generating reply");
            match strategy.generate(request).await {
                Ok(reply) => return reply,
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "reply strategy failed, falling back")
                }
            }
        }
        Reply::Degraded(NO_REPLY_MESSAGE.to_string())
    }
}

fn build_tools(config: &Config, timeout: Duration) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    if config.web_search_enabled {
        match WebSearchTool::new(config.search_base_url.clone(), timeout) {
            Ok(tool) => registry.register(tool),
            Err(e) => tracing::warn!(error = %e, "web search unavailable"),
        }
    }
    registry
}

fn build_memory(config: &Config, timeout: Duration) -> MemoryGateway {
    let Some(ref api_key) = config.mem0_api_key else {
        return MemoryGateway::disabled();
    };

    let client = match Mem0Client::new(api_key.clone(), config.mem0_base_url.clone(), timeout) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize memory client");
            return MemoryGateway::disabled();
        }
    };

    let translator = if config.translator_enabled {
        match GoogleTranslator::new(config.translate_base_url.clone(), timeout) {
            Ok(t) => TranslatorAdapter::new(Arc::new(t)),
            Err(e) => {
                tracing::warn!(error = %e, "translator unavailable, storing memories untranslated");
                TranslatorAdapter::passthrough()
            }
        }
    } else {
        TranslatorAdapter::passthrough()
    };

    MemoryGateway::new(Arc::new(client), translator)
}
