//! Reply strategies
//!
//! A strategy either produces a reply or reports why it could not. The
//! orchestrator tries strategies in order and keeps the first reply.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Persona;
use crate::conversation::{Language, Message};
use crate::providers::{OpenAICompatProvider, ProviderError};

/// Inputs for generating one reply
#[derive(Debug, Clone, Copy)]
pub struct ReplyRequest<'a> {
    pub message: &'a str,
    pub context: &'a str,
    pub language: Language,
}

/// Text to show the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A model answer; this gets saved to memory
    Generated(String),
    /// A failure message standing in for an answer; never saved
    Degraded(String),
}

/// Why a strategy gave up and the next one should run
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Model returned an empty reply")]
    EmptyReply,

    #[error("Max tool iterations exceeded")]
    MaxIterationsExceeded,
}

#[async_trait]
pub trait ReplyStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &ReplyRequest<'_>) -> Result<Reply, ReplyError>;
}

/// One chat-completion call with the persona as system message.
///
/// Never fails: transport and API errors come back as degraded replies.
pub struct DirectStrategy {
    provider: Arc<OpenAICompatProvider>,
    persona: Persona,
}

impl DirectStrategy {
    pub fn new(provider: Arc<OpenAICompatProvider>, persona: Persona) -> Self {
        Self { provider, persona }
    }
}

#[async_trait]
impl ReplyStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn generate(&self, request: &ReplyRequest<'_>) -> Result<Reply, ReplyError> {
        let messages = [
            Message::system(self.persona.system_prompt(request.language, request.context)),
            Message::user(request.message),
        ];

        match self.provider.chat(&messages, "").await {
            Ok(reply) => Ok(Reply::Generated(reply.content)),
            Err(e) => {
                tracing::warn!(error = %e, "completion request failed");
                Ok(Reply::Degraded(e.user_message()))
            }
        }
    }
}
