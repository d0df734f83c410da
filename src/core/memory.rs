//! Long-term conversational memory backed by an external service
//!
//! The gateway reads recent memories to give the model context and appends
//! each completed turn afterwards. Memory is an enhancement: no failure here
//! may stop a chat turn, so both operations log and swallow errors.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::conversation::{Language, Message};

use super::translate::TranslatorAdapter;

/// Memories older than this are left out of the prompt context
pub const FRESHNESS_WINDOW_DAYS: i64 = 30;

/// A memory entry as returned by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(default)]
    pub memory: Option<String>,

    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl MemoryRecord {
    /// `timestamp` wins over `created_at`; blank values count as missing
    fn time_str(&self) -> Option<&str> {
        self.timestamp
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.created_at.as_deref().filter(|t| !t.trim().is_empty()))
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.time_str().and_then(parse_timestamp)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait MemoryService: Send + Sync {
    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryRecord>, MemoryError>;

    async fn add(&self, messages: &[Message], user_id: &str) -> Result<(), MemoryError>;
}

/// Parse a memory timestamp.
///
/// Accepts RFC 3339 (trailing `Z` or an offset) and bare ISO-8601 date-times
/// or dates. Bare values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Mem0 hosted memory REST client
pub struct Mem0Client {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    List(Vec<Value>),
    Wrapped { results: Vec<Value> },
}

impl Mem0Client {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, MemoryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<String, MemoryError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(MemoryError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl MemoryService for Mem0Client {
    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryRecord>, MemoryError> {
        let body = self
            .post(
                "/v1/memories/search/",
                json!({ "query": query, "user_id": user_id }),
            )
            .await?;

        let entries = match serde_json::from_str::<SearchResponse>(&body)
            .map_err(|e| MemoryError::InvalidResponse(e.to_string()))?
        {
            SearchResponse::List(entries) => entries,
            SearchResponse::Wrapped { results } => results,
        };

        // Entries that are not objects are ignored rather than failing the search
        Ok(entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect())
    }

    async fn add(&self, messages: &[Message], user_id: &str) -> Result<(), MemoryError> {
        self.post(
            "/v1/memories/",
            json!({ "messages": messages, "user_id": user_id }),
        )
        .await?;
        Ok(())
    }
}

/// Used when no memory service is configured
pub struct NoopMemory;

#[async_trait]
impl MemoryService for NoopMemory {
    async fn search(&self, _query: &str, _user_id: &str) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(Vec::new())
    }

    async fn add(&self, _messages: &[Message], _user_id: &str) -> Result<(), MemoryError> {
        Ok(())
    }
}

/// Reads context from and records turns to the memory service
pub struct MemoryGateway {
    service: Arc<dyn MemoryService>,
    translator: TranslatorAdapter,
    enabled: bool,
}

impl MemoryGateway {
    pub fn new(service: Arc<dyn MemoryService>, translator: TranslatorAdapter) -> Self {
        Self {
            service,
            translator,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            service: Arc::new(NoopMemory),
            translator: TranslatorAdapter::passthrough(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn translator(&self) -> &TranslatorAdapter {
        &self.translator
    }

    /// Fresh memories for `user_id`, newline-joined in service order
    pub async fn fetch_context(&self, user_id: &str) -> String {
        self.fetch_context_at(user_id, Utc::now()).await
    }

    pub async fn fetch_context_at(&self, user_id: &str, now: DateTime<Utc>) -> String {
        if !self.enabled {
            return String::new();
        }

        let records = match self.service.search("*", user_id).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "memory search failed, continuing without context");
                return String::new();
            }
        };

        let window = Duration::days(FRESHNESS_WINDOW_DAYS);
        let total = records.len();
        let fresh: Vec<String> = records
            .into_iter()
            .filter(|record| match record.created() {
                Some(created) => now - created < window,
                None => false,
            })
            .filter_map(|record| record.memory.filter(|m| !m.is_empty()))
            .collect();

        tracing::debug!(user_id, total, fresh = fresh.len(), "memory context assembled");
        fresh.join("\n")
    }

    /// Store a completed turn as one paired write, translated to English if needed
    pub async fn record_turn(
        &self,
        user_id: &str,
        language: Language,
        user_text: &str,
        reply_text: &str,
    ) {
        if !self.enabled {
            return;
        }

        let (user_english, reply_english) = self
            .translator
            .pair_to_english(user_text, reply_text, language)
            .await;

        let messages = [Message::user(user_english), Message::assistant(reply_english)];
        if let Err(e) = self.service.add(&messages, user_id).await {
            tracing::error!(error = %e, user_id, "failed to save turn to memory");
        }
    }
}
