//! Empathetic reply generation.

pub mod chat;
pub mod orchestrator;
pub mod prompts;

pub use chat::{ChatBackend, ChatMessage, ChatRole, MockChat, OfflineChat};
pub use orchestrator::{
    EmpatheticReply, OrchestratorConfig, ReplySource, ResponseOrchestrator, build_messages,
};
