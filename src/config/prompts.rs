//! Persona and prompt construction
//!
//! The built-in persona is Sutra, a friendly mentor. A persona file can
//! replace its instructions.
//!
//! # Example Persona File
//!
//! ```toml
//! [persona]
//! name = "Sutra"
//! description = "AI friend and mentor"
//!
//! [instructions]
//! lines = [
//!     "You are Sutra, an AI friend and mentor who lives in Pune, India.",
//!     "Respond kindly and personally in {language}.",
//! ]
//! ```
//!
//! `{language}` is replaced with the language the reply should be written in.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::conversation::Language;

const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// A persona template as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub persona: PersonaInfo,
    pub instructions: Instructions,
}

/// Persona metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaInfo {
    /// Display name of the persona
    pub name: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructions {
    pub lines: Vec<String>,
}

/// Persona used by both reply strategies
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    lines: Vec<String>,
}

impl Persona {
    pub fn builtin() -> Self {
        Self {
            name: builtin::NAME.to_string(),
            lines: builtin::INSTRUCTIONS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Load a persona from a TOML file
    pub async fn load_from_file(path: &Path) -> Result<Self, PromptError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        let template: PromptTemplate =
            toml::from_str(&content).map_err(|e| PromptError::ParseError(e.to_string()))?;

        if template.instructions.lines.is_empty() {
            return Err(PromptError::ParseError(
                "persona has no instructions".to_string(),
            ));
        }

        Ok(Self {
            name: template.persona.name,
            lines: template.instructions.lines,
        })
    }

    fn render(&self, language: &str) -> String {
        self.lines
            .iter()
            .map(|l| l.replace(LANGUAGE_PLACEHOLDER, language))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// System message for the direct completion call
    pub fn system_prompt(&self, language: Language, context: &str) -> String {
        format!(
            "{}\n\nContext from previous conversations: {}",
            self.render(language.tag()),
            context
        )
    }

    /// Instructions for the agent; language and context travel in the user prompt
    pub fn agent_instructions(&self, web_search: bool, now: DateTime<Local>) -> String {
        let mut instructions = self.render(builtin::CHOSEN_LANGUAGE);
        if web_search {
            instructions.push('\n');
            instructions.push_str(builtin::WEB_SEARCH);
        }
        instructions.push_str(&format!(
            "\nThe current date and time is {}.",
            now.format("%Y-%m-%d %H:%M:%S %Z")
        ));
        instructions
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::builtin()
    }
}

/// User prompt the agent receives for one turn
pub fn agent_prompt(language: Language, context: &str, message: &str) -> String {
    format!(
        "Language: {}\nContext: {}\n\nUser: {}",
        language.tag(),
        context,
        message
    )
}

/// Errors from persona loading
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Built-in persona text
pub mod builtin {
    pub const NAME: &str = "Sutra";

    pub const INSTRUCTIONS: [&str; 5] = [
        "You are Sutra, an AI friend and mentor who lives in Pune, India.",
        "You enjoy helping people and chatting with them in a human-like, empathetic tone.",
        "Respond kindly, supportively, and personally in {language}.",
        "Avoid generic AI disclaimers like 'I'm just an AI'. Instead, say you're Sutra, their AI friend.",
        "Respect emotional context. Give thoughtful, kind responses.",
    ];

    pub const CHOSEN_LANGUAGE: &str = "the user's chosen language";

    pub const WEB_SEARCH: &str = "If needed, use web search to gather data.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_carries_language_and_context() {
        let prompt = Persona::builtin().system_prompt(Language::Hindi, "likes chai");

        assert!(prompt.starts_with("You are Sutra"));
        assert!(prompt.contains("personally in hindi."));
        assert!(prompt.ends_with("Context from previous conversations: likes chai"));
        assert!(!prompt.contains(LANGUAGE_PLACEHOLDER));
    }

    #[test]
    fn test_agent_instructions() {
        let now = Local::now();
        let with_search = Persona::builtin().agent_instructions(true, now);
        assert!(with_search.contains("in the user's chosen language"));
        assert!(with_search.contains(builtin::WEB_SEARCH));
        assert!(with_search.contains("current date and time"));

        let without = Persona::builtin().agent_instructions(false, now);
        assert!(!without.contains(builtin::WEB_SEARCH));
    }

    #[test]
    fn test_agent_prompt_layout() {
        let prompt = agent_prompt(Language::Tamil, "ctx", "Vanakkam");
        assert_eq!(prompt, "Language: tamil\nContext: ctx\n\nUser: Vanakkam");
    }

    #[tokio::test]
    async fn test_load_persona_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mentor.toml");
        std::fs::write(
            &path,
            r#"
[persona]
name = "Guru"

[instructions]
lines = ["You are Guru.", "Answer in {language}."]
"#,
        )
        .unwrap();

        let persona = Persona::load_from_file(&path).await.unwrap();
        assert_eq!(persona.name, "Guru");
        assert_eq!(
            persona.system_prompt(Language::Gujarati, ""),
            "You are Guru.\nAnswer in gujarati.\n\nContext from previous conversations: "
        );
    }

    #[tokio::test]
    async fn test_load_persona_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Persona::load_from_file(&dir.path().join("missing.toml")).await;
        assert!(matches!(missing, Err(PromptError::IoError(_))));

        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "[persona]\nname = \"x\"\n[instructions]\nlines = []\n").unwrap();
        let empty = Persona::load_from_file(&path).await;
        assert!(matches!(empty, Err(PromptError::ParseError(_))));
    }
}
