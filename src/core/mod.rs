//! Core chat pipeline
//!
//! Memory, translation, reply strategies and the orchestrator that runs one
//! chat turn through them.

mod agent;
mod chat;
mod memory;
mod reply;
mod translate;

pub use agent::{extract_tool_calls, AgentStrategy, ToolCall};
pub use chat::{ChatError, TurnOrchestrator, API_KEY_REQUIRED, NO_REPLY_MESSAGE};
pub use memory::{
    parse_timestamp, Mem0Client, MemoryError, MemoryGateway, MemoryRecord, MemoryService,
    NoopMemory, FRESHNESS_WINDOW_DAYS,
};
pub use reply::{DirectStrategy, Reply, ReplyError, ReplyRequest, ReplyStrategy};
pub use translate::{
    GoogleTranslator, PassthroughTranslator, TranslateError, TranslationService, TranslatorAdapter,
};
