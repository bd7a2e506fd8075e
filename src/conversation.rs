//! Conversation turns and the caller-side bounded history.

use crate::defaults;
use crate::emotion::EmotionLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => f.write_str("user"),
            TurnRole::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub emotion: Option<EmotionLabel>,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>, emotion: Option<EmotionLabel>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            emotion,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, emotion: EmotionLabel) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            emotion: Some(emotion),
            created_at: Utc::now(),
        }
    }

    /// Render as a `role: text` prompt line.
    pub fn prompt_line(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }
}

/// Fixed-capacity history; pushing past capacity drops the oldest turn.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    /// All retained turns, oldest first.
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(defaults::HISTORY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_line_uses_role_prefix() {
        let turn = ConversationTurn::user("hi there", None);
        assert_eq!(turn.prompt_line(), "user: hi there");

        let turn = ConversationTurn::assistant("hello", EmotionLabel::Neutral);
        assert_eq!(turn.prompt_line(), "assistant: hello");
    }

    #[test]
    fn history_drops_oldest_past_capacity() {
        let mut history = ConversationHistory::new(2);
        history.push(ConversationTurn::user("one", None));
        history.push(ConversationTurn::user("two", None));
        history.push(ConversationTurn::user("three", None));

        let texts: Vec<String> = history.turns().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn recent_returns_tail_oldest_first() {
        let mut history = ConversationHistory::new(6);
        for text in ["a", "b", "c", "d"] {
            history.push(ConversationTurn::user(text, None));
        }
        let texts: Vec<String> = history.recent(3).into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["b", "c", "d"]);
    }

    #[test]
    fn recent_with_more_than_len_returns_all() {
        let mut history = ConversationHistory::new(6);
        history.push(ConversationTurn::user("only", None));
        assert_eq!(history.recent(10).len(), 1);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let history = ConversationHistory::new(0);
        assert_eq!(history.capacity(), 1);
    }

    #[test]
    fn default_capacity_matches_window() {
        assert_eq!(
            ConversationHistory::default().capacity(),
            defaults::HISTORY_WINDOW
        );
    }
}
