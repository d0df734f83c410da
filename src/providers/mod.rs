//! Hosted model provider integrations

pub mod openai_compat;

use thiserror::Error;

pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider, ToolDef};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API Error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected error: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl ProviderError {
    /// Text shown to the user in place of a reply
    pub fn user_message(&self) -> String {
        format!("⚠️ {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_distinguishable() {
        let status = ProviderError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(status.user_message(), "⚠️ API Error: 500 - boom");
        assert_eq!(
            ProviderError::Timeout.user_message(),
            "⚠️ Request timed out. Please try again."
        );
        assert!(ProviderError::Network("refused".into())
            .user_message()
            .starts_with("⚠️ Network error: refused"));
        assert!(ProviderError::InvalidResponse("bad json".into())
            .user_message()
            .starts_with("⚠️ Unexpected error:"));
    }
}
