//! Empathetic reply generation with deterministic fallback.

use crate::conversation::ConversationTurn;
use crate::defaults;
use crate::emotion::{EmotionLabel, EmotionResult};
use crate::error::{HavenError, Result};
use crate::random::{RandomSource, ThreadRandom, choose};
use crate::response::chat::{ChatBackend, ChatMessage};
use crate::response::prompts::{affirmations, fallback_message, system_template};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Intensity above which a generated reply suggests a visualization.
const VISUALIZATION_INTENSITY: f32 = 0.6;

/// Intensity above which a generated reply suggests audio.
const AUDIO_INTENSITY: f32 = 0.4;

/// Where a reply's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Generated,
    Fallback,
}

/// A reply plus the follow-up intents the caller may act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpatheticReply {
    pub id: String,
    pub text: String,
    pub emotion: EmotionLabel,
    pub suggest_visualization: bool,
    pub suggest_audio: bool,
    pub affirmation: Option<String>,
    pub source: ReplySource,
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on how long a chat request may take. `None` waits indefinitely.
    pub chat_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            chat_timeout: Some(Duration::from_secs(defaults::CHAT_TIMEOUT_SECS)),
        }
    }
}

/// Builds prompts, calls the chat backend and absorbs every failure.
pub struct ResponseOrchestrator {
    config: OrchestratorConfig,
    random: Arc<dyn RandomSource>,
}

impl ResponseOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            random: Arc::new(ThreadRandom),
        }
    }

    /// Sets the random source used for affirmation selection.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Produce a reply for `user_text`.
    ///
    /// Only the last `max_history_for_prompt` turns of `history` reach the
    /// prompt. Never fails: backend errors, timeouts and blank answers all
    /// yield the fallback reply for the detected emotion.
    pub async fn respond(
        &self,
        user_text: &str,
        result: &EmotionResult,
        history: &[ConversationTurn],
        max_history_for_prompt: usize,
        chat: &dyn ChatBackend,
    ) -> EmpatheticReply {
        let emotion = result.label;
        let messages = build_messages(user_text, emotion, history, max_history_for_prompt);

        debug!(
            backend = chat.name(),
            %emotion,
            turns = history.len().min(max_history_for_prompt),
            "requesting empathetic reply"
        );

        match self.call_backend(chat, messages).await {
            Ok(text) => EmpatheticReply {
                id: new_reply_id(),
                text,
                emotion,
                suggest_visualization: result.intensity > VISUALIZATION_INTENSITY
                    && matches!(
                        emotion,
                        EmotionLabel::Sad
                            | EmotionLabel::Anxious
                            | EmotionLabel::Stressed
                            | EmotionLabel::Lonely
                    ),
                suggest_audio: result.intensity > AUDIO_INTENSITY,
                affirmation: self.affirmation(emotion),
                source: ReplySource::Generated,
            },
            Err(e) => {
                warn!(backend = chat.name(), "chat failed, using fallback reply: {e}");
                self.fallback(emotion)
            }
        }
    }

    /// The deterministic reply used when generation fails.
    pub fn fallback(&self, emotion: EmotionLabel) -> EmpatheticReply {
        EmpatheticReply {
            id: new_reply_id(),
            text: fallback_message(emotion).to_string(),
            emotion,
            suggest_visualization: matches!(
                emotion,
                EmotionLabel::Sad | EmotionLabel::Anxious | EmotionLabel::Stressed
            ),
            suggest_audio: true,
            affirmation: self.affirmation(emotion),
            source: ReplySource::Fallback,
        }
    }

    async fn call_backend(
        &self,
        chat: &dyn ChatBackend,
        messages: Vec<ChatMessage>,
    ) -> Result<String> {
        let text = match self.config.chat_timeout {
            Some(limit) => tokio::time::timeout(limit, chat.send(messages))
                .await
                .map_err(|_| HavenError::ChatTimeout {
                    seconds: limit.as_secs(),
                })??,
            None => chat.send(messages).await?,
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(HavenError::ChatEmptyResponse);
        }
        Ok(trimmed.to_string())
    }

    fn affirmation(&self, emotion: EmotionLabel) -> Option<String> {
        choose(self.random.as_ref(), affirmations(emotion)).map(|a| (*a).to_string())
    }
}

impl Default for ResponseOrchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}

/// Assemble the system directive and user body sent to the backend.
pub fn build_messages(
    user_text: &str,
    emotion: EmotionLabel,
    history: &[ConversationTurn],
    max_history_for_prompt: usize,
) -> Vec<ChatMessage> {
    let skip = history.len().saturating_sub(max_history_for_prompt);
    let context: Vec<String> = history
        .iter()
        .skip(skip)
        .map(ConversationTurn::prompt_line)
        .collect();

    let mut body = String::new();
    if !context.is_empty() {
        body.push_str("Recent context:\n");
        body.push_str(&context.join("\n"));
        body.push_str("\n\n");
    }
    body.push_str("User: ");
    body.push_str(user_text);
    body.push_str("\n\nRespond with empathy and care:");

    vec![
        ChatMessage::system(system_template(emotion)),
        ChatMessage::user(body),
    ]
}

fn new_reply_id() -> String {
    format!("resp-{}", uuid::Uuid::new_v4())
}
