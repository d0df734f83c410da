//! Sutra Friend - multilingual AI friend chatbot API
//!
//! Each chat turn pulls recent memories for the user from Mem0, asks the Sutra
//! model for a reply (agent with web search first, a direct completion call
//! as fallback) and stores the finished turn back in memory, translated to
//! English when the chat runs in another language.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

pub mod config;
pub mod conversation;
pub mod core;
pub mod providers;
pub mod routes;
pub mod tools;

#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::conversation::SessionContext;
use crate::core::TurnOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` until a model API key is configured
    pub orchestrator: Option<Arc<TurnOrchestrator>>,
    /// Read and written briefly; never held across a model call
    pub session: Arc<RwLock<SessionContext>>,
    /// Held for a whole chat turn so turns run one at a time
    pub turn_lock: Arc<Mutex<()>>,
}
