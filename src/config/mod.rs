//! Application configuration

pub mod prompts;
pub mod settings;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::conversation::Language;
use crate::providers::openai_compat::{SUTRA_BASE_URL, SUTRA_MODEL};
use crate::tools::web_search::DUCKDUCKGO_BASE_URL;

pub use prompts::Persona;
pub use settings::{ConfigError, FileConfig};

pub const MEM0_BASE_URL: &str = "https://api.mem0.ai";
pub const TRANSLATE_BASE_URL: &str = "https://translate.googleapis.com";
pub const DEFAULT_USER_ID: &str = "simple_session_2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub sutra_api_key: Option<String>,
    pub sutra_base_url: String,
    pub sutra_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,

    pub mem0_api_key: Option<String>,
    pub mem0_base_url: String,

    pub agent_enabled: bool,
    pub web_search_enabled: bool,
    pub search_base_url: String,
    pub persona_file: Option<PathBuf>,

    pub translator_enabled: bool,
    pub translate_base_url: String,

    pub user_id: String,
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            sutra_api_key: None,
            sutra_base_url: SUTRA_BASE_URL.into(),
            sutra_model: SUTRA_MODEL.into(),
            max_tokens: 500,
            temperature: 0.7,
            request_timeout_secs: 30,
            mem0_api_key: None,
            mem0_base_url: MEM0_BASE_URL.into(),
            agent_enabled: true,
            web_search_enabled: true,
            search_base_url: DUCKDUCKGO_BASE_URL.into(),
            persona_file: None,
            translator_enabled: true,
            translate_base_url: TRANSLATE_BASE_URL.into(),
            user_id: DEFAULT_USER_ID.into(),
            language: Language::English,
        }
    }
}

impl Config {
    /// Read the optional `SUTRA_CONFIG` file, then overlay the environment
    pub fn load() -> anyhow::Result<Self> {
        let file = match env::var("SUTRA_CONFIG") {
            Ok(path) if !path.trim().is_empty() => FileConfig::from_file(path.trim().as_ref())?,
            _ => FileConfig::default(),
        };
        Self::resolve(&file, |key| env::var(key).ok())
    }

    /// Merge defaults, file settings and variables from `lookup`, in rising priority
    pub fn resolve<F>(file: &FileConfig, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let sutra_key_env = file.llm.api_key_env.as_deref().unwrap_or("SUTRA_API_KEY");
        let mem0_key_env = file.memory.api_key_env.as_deref().unwrap_or("MEM0_API_KEY");

        let language = match var("SUTRA_LANGUAGE").or_else(|| file.session.language.clone()) {
            Some(lang) => lang.parse::<Language>()?,
            None => defaults.language,
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: match var("PORT") {
                Some(p) => p.parse::<u16>()?,
                None => defaults.port,
            },
            sutra_api_key: var(sutra_key_env),
            sutra_base_url: var("SUTRA_BASE_URL")
                .or_else(|| file.llm.base_url.clone())
                .unwrap_or(defaults.sutra_base_url),
            sutra_model: var("SUTRA_MODEL")
                .or_else(|| file.llm.model.clone())
                .unwrap_or(defaults.sutra_model),
            max_tokens: file.llm.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: file.llm.temperature.unwrap_or(defaults.temperature),
            request_timeout_secs: match var("REQUEST_TIMEOUT_SECS") {
                Some(secs) => secs.parse::<u64>()?,
                None => file.llm.timeout_secs.unwrap_or(defaults.request_timeout_secs),
            },
            mem0_api_key: var(mem0_key_env),
            mem0_base_url: var("MEM0_BASE_URL")
                .or_else(|| file.memory.base_url.clone())
                .unwrap_or(defaults.mem0_base_url),
            agent_enabled: flag(var("AGENT_ENABLED"), file.agent.enabled, defaults.agent_enabled)?,
            web_search_enabled: flag(
                var("WEB_SEARCH_ENABLED"),
                file.agent.web_search,
                defaults.web_search_enabled,
            )?,
            search_base_url: var("SEARCH_BASE_URL")
                .or_else(|| file.agent.search_base_url.clone())
                .unwrap_or(defaults.search_base_url),
            persona_file: var("SUTRA_PERSONA_FILE")
                .map(PathBuf::from)
                .or_else(|| file.agent.persona_file.clone()),
            translator_enabled: flag(
                var("TRANSLATOR_ENABLED"),
                file.translator.enabled,
                defaults.translator_enabled,
            )?,
            translate_base_url: var("TRANSLATE_BASE_URL")
                .or_else(|| file.translator.base_url.clone())
                .unwrap_or(defaults.translate_base_url),
            user_id: var("SUTRA_USER_ID")
                .or_else(|| file.session.user_id.clone())
                .unwrap_or(defaults.user_id),
            language,
        })
    }
}

fn flag(env_value: Option<String>, file_value: Option<bool>, default: bool) -> anyhow::Result<bool> {
    match env_value {
        Some(v) => parse_bool(&v),
        None => Ok(file_value.unwrap_or(default)),
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean value: {}", other),
    }
}
