//! English normalization for memory writes
//!
//! Memory is stored in English whatever language the chat runs in. This is
//! best effort: a failed translation keeps the original text.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::conversation::Language;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate `text` into the language with code `dest` (e.g. "en")
    async fn translate(&self, text: &str, dest: &str) -> Result<String, TranslateError>;
}

/// Google translate web endpoint, source language auto-detected
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TranslateError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl TranslationService for GoogleTranslator {
    async fn translate(&self, text: &str, dest: &str) -> Result<String, TranslateError> {
        let body: Value = self
            .client
            .get(format!(
                "{}/translate_a/single",
                self.base_url.trim_end_matches('/')
            ))
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", dest),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // [[["translated", "source", ...], ...], ...]
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| TranslateError::InvalidResponse(body.to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        if translated.is_empty() && !text.is_empty() {
            return Err(TranslateError::InvalidResponse(
                "no translated segments".to_string(),
            ));
        }
        Ok(translated)
    }
}

/// Used when translation is disabled
pub struct PassthroughTranslator;

#[async_trait]
impl TranslationService for PassthroughTranslator {
    async fn translate(&self, text: &str, _dest: &str) -> Result<String, TranslateError> {
        Ok(text.to_string())
    }
}

#[derive(Clone)]
pub struct TranslatorAdapter {
    service: Arc<dyn TranslationService>,
    enabled: bool,
}

impl TranslatorAdapter {
    pub fn new(service: Arc<dyn TranslationService>) -> Self {
        Self {
            service,
            enabled: true,
        }
    }

    pub fn passthrough() -> Self {
        Self {
            service: Arc::new(PassthroughTranslator),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn skips(&self, source: Language) -> bool {
        source.is_english() || !self.enabled
    }

    pub async fn to_english(&self, text: &str, source: Language) -> String {
        if self.skips(source) {
            return text.to_string();
        }

        match self.service.translate(text, "en").await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(error = %e, language = source.tag(), "translation failed, keeping original text");
                text.to_string()
            }
        }
    }

    /// Translate a user/reply pair together.
    ///
    /// If either half fails both are returned untranslated, so a stored pair
    /// never mixes languages.
    pub async fn pair_to_english(&self, user: &str, reply: &str, source: Language) -> (String, String) {
        if self.skips(source) {
            return (user.to_string(), reply.to_string());
        }

        let translated = async {
            let user = self.service.translate(user, "en").await?;
            let reply = self.service.translate(reply, "en").await?;
            Ok::<_, TranslateError>((user, reply))
        };

        match translated.await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, language = source.tag(), "translation failed, keeping original turn");
                (user.to_string(), reply.to_string())
            }
        }
    }
}
