//! Deployment settings loaded from a TOML file
//!
//! Every section is optional; anything left out falls back to the built-in
//! defaults, and environment variables override what the file says.
//!
//! ```toml
//! [llm]
//! base_url = "https://api.two.ai/v2"
//! model = "sutra-v2"
//! api_key_env = "SUTRA_API_KEY"
//! max_tokens = 500
//! temperature = 0.7
//!
//! [memory]
//! api_key_env = "MEM0_API_KEY"
//!
//! [agent]
//! enabled = true
//! web_search = true
//!
//! [translator]
//! enabled = true
//!
//! [session]
//! user_id = "simple_session_2"
//! language = "hindi"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub llm: LlmSection,

    #[serde(default)]
    pub memory: MemorySection,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub translator: TranslatorSection,

    #[serde(default)]
    pub session: SessionSection,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.llm.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Validation(format!(
                    "llm.temperature must be between 0 and 2, got {}",
                    t
                )));
            }
        }
        if self.llm.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Completions API settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Memory service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySection {
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Agent strategy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub web_search: Option<bool>,

    #[serde(default)]
    pub search_base_url: Option<String>,

    /// Persona TOML replacing the built-in instructions
    #[serde(default)]
    pub persona_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorSection {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub language: Option<String>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[llm]
base_url = "https://llm.internal/v2"
model = "sutra-v2"
api_key_env = "TEAM_SUTRA_KEY"
max_tokens = 800
temperature = 0.4

[memory]
api_key_env = "TEAM_MEM0_KEY"

[agent]
enabled = false
persona_file = "personas/mentor.toml"

[translator]
enabled = true

[session]
user_id = "pune-kiosk"
language = "marathi"
"#;

    #[test]
    fn test_parse_config() {
        let config = FileConfig::parse(SAMPLE_CONFIG).unwrap();

        assert_eq!(config.llm.base_url.as_deref(), Some("https://llm.internal/v2"));
        assert_eq!(config.llm.api_key_env.as_deref(), Some("TEAM_SUTRA_KEY"));
        assert_eq!(config.llm.max_tokens, Some(800));
        assert_eq!(config.memory.api_key_env.as_deref(), Some("TEAM_MEM0_KEY"));
        assert_eq!(config.agent.enabled, Some(false));
        assert_eq!(
            config.agent.persona_file,
            Some(PathBuf::from("personas/mentor.toml"))
        );
        assert_eq!(config.session.language.as_deref(), Some("marathi"));
    }

    #[test]
    fn test_empty_config() {
        let config = FileConfig::parse("").unwrap();
        assert!(config.llm.base_url.is_none());
        assert!(config.agent.enabled.is_none());
        assert!(config.session.user_id.is_none());
    }

    #[test]
    fn test_validation() {
        let err = FileConfig::parse("[llm]\ntemperature = 5.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = FileConfig::parse("[llm]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sutra.toml");
        std::fs::write(&path, "[session]\nuser_id = \"from-file\"\n").unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.session.user_id.as_deref(), Some("from-file"));

        let missing = FileConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
