//! Conversation types and session state

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Languages a user can chat in.
///
/// The lowercase tag is what goes into prompts and decides whether memory
/// writes need translating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Marathi,
    Gujarati,
    Tamil,
    Telugu,
    Kannada,
    Punjabi,
    Bihari,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::English,
        Language::Hindi,
        Language::Marathi,
        Language::Gujarati,
        Language::Tamil,
        Language::Telugu,
        Language::Kannada,
        Language::Punjabi,
        Language::Bihari,
    ];

    /// Display name shown to users
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Kannada => "Kannada",
            Language::Punjabi => "Punjabi",
            Language::Bihari => "Bihari",
        }
    }

    /// Canonical lowercase tag
    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Marathi => "marathi",
            Language::Gujarati => "gujarati",
            Language::Tamil => "tamil",
            Language::Telugu => "telugu",
            Language::Kannada => "kannada",
            Language::Punjabi => "punjabi",
            Language::Bihari => "bihari",
        }
    }

    pub fn is_english(&self) -> bool {
        matches!(self, Language::English)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.tag() == wanted)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Per-user chat state owned by the presentation layer.
///
/// Turns are kept for display only; the memory service owns long-term history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: Uuid,
    pub user_id: String,
    pub language: Language,
    pub turns: Vec<Message>,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, language: Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            language,
            turns: Vec::new(),
        }
    }

    pub fn add_user(&mut self, content: &str) {
        self.turns.push(Message::user(content));
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.turns.push(Message::assistant(content));
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("Hindi".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!("  tamil ".parse::<Language>().unwrap(), Language::Tamil);
        assert_eq!("BIHARI".parse::<Language>().unwrap(), Language::Bihari);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_tags_are_lowercase_names() {
        for lang in Language::ALL {
            assert_eq!(lang.tag(), lang.name().to_lowercase());
        }
        assert!(Language::English.is_english());
        assert!(!Language::Punjabi.is_english());
    }

    #[test]
    fn test_language_serde_uses_tag() {
        let json = serde_json::to_string(&Language::Kannada).unwrap();
        assert_eq!(json, "\"kannada\"");
    }

    #[test]
    fn test_session_turn_order() {
        let mut session = SessionContext::new("user-1", Language::English);
        session.add_user("Hello");
        session.add_assistant("Hi there!");

        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[0].role, Role::User);
        assert_eq!(session.turns[1].role, Role::Assistant);

        session.clear();
        assert!(session.turns.is_empty());
        assert_eq!(session.user_id, "user-1");
    }
}
