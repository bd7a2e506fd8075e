//! Chat backend seam.
//!
//! The transport to the language model lives outside this crate; the
//! orchestrator only sees `ChatBackend::send`.

use crate::error::{HavenError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Trait for language-model chat backends.
///
/// Implementations own transport, auth and retries. Any `Err` is treated by
/// the orchestrator as a generation failure.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send an ordered message list and return the model's text.
    async fn send(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Return the name of this backend for logging.
    fn name(&self) -> &str;
}

/// Backend for running without a model: every request fails, so replies come
/// from the fallback table.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineChat;

#[async_trait]
impl ChatBackend for OfflineChat {
    async fn send(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        Err(HavenError::ChatRequest {
            message: "no chat backend configured".to_string(),
        })
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Scripted backend for testing.
///
/// Replies are consumed in order; once exhausted the default reply is used.
/// Every request is recorded for inspection.
#[derive(Debug)]
pub struct MockChat {
    replies: Mutex<VecDeque<Result<String>>>,
    default_reply: String,
    should_fail: bool,
    delay: Option<Duration>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: "mock reply".to_string(),
            should_fail: false,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Configure the reply returned when no scripted reply is queued.
    pub fn with_reply(mut self, reply: &str) -> Self {
        self.default_reply = reply.to_string();
        self
    }

    /// Queue a one-shot result.
    pub fn with_queued(self, result: Result<String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(result);
        }
        self
    }

    /// Configure the mock to fail every request.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to wait before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for MockChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    async fn send(&self, messages: Vec<ChatMessage>) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(HavenError::ChatRequest {
                message: "mock chat failure".to_string(),
            });
        }
        let queued = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        match queued {
            Some(result) => result,
            None => Ok(self.default_reply.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_chat_always_fails() {
        let chat = OfflineChat;
        let result = chat.send(vec![ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(HavenError::ChatRequest { .. })));
        assert_eq!(chat.name(), "offline");
    }

    #[tokio::test]
    async fn mock_chat_returns_queued_then_default() {
        let chat = MockChat::new()
            .with_reply("fallthrough")
            .with_queued(Ok("first".to_string()))
            .with_queued(Err(HavenError::ChatEmptyResponse));

        assert_eq!(chat.send(vec![]).await.unwrap(), "first");
        assert!(chat.send(vec![]).await.is_err());
        assert_eq!(chat.send(vec![]).await.unwrap(), "fallthrough");
        assert_eq!(chat.requests().len(), 3);
    }

    #[tokio::test]
    async fn mock_chat_failure_overrides_replies() {
        let chat = MockChat::new().with_failure();
        assert!(chat.send(vec![ChatMessage::user("x")]).await.is_err());
    }

    #[test]
    fn chat_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("be kind")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be kind"}"#);
    }

    #[test]
    fn chat_backend_trait_object_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ChatBackend>();
    }
}
