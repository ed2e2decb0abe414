//! Turn model for the conversation store
//!
//! - Turn = one message, from the user or the assistant
//! - Crisis cards are assistant turns flagged `is_crisis_card`
//! - Store = ordered turns; order is transcript order and context order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::GREETING;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Role name on the remote API wire
    pub fn wire_role(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "model",
        }
    }

    /// Label used in exports and the terminal
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    /// Fixed crisis card rather than model output
    #[serde(default)]
    pub is_crisis_card: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text, false)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text, false)
    }

    /// Crisis card turn, always authored by the assistant
    pub fn crisis_card(markup: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, markup, true)
    }

    fn new(speaker: Speaker, text: impl Into<String>, is_crisis_card: bool) -> Self {
        Self {
            speaker,
            text: text.into(),
            is_crisis_card,
            created_at: Utc::now(),
        }
    }

    /// Whether this turn belongs in the model's context window
    pub fn in_context(&self) -> bool {
        !self.is_crisis_card
    }
}

/// Ordered turns of one session
#[derive(Debug, Clone)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// Create store holding the greeting turn
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
        }
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns (oldest first)
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns sent to the remote model, crisis cards removed
    pub fn context(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.in_context())
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Last turn is the user's and still has no reply
    pub fn ends_with_user(&self) -> bool {
        matches!(self.last(), Some(t) if t.speaker == Speaker::User)
    }

    /// Back to the single greeting turn
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::assistant(GREETING));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_has_greeting() {
        let store = ConversationStore::new();
        assert_eq!(store.len(), 1);
        let first = store.last().unwrap();
        assert_eq!(first.speaker, Speaker::Assistant);
        assert_eq!(first.text, GREETING);
        assert!(!first.is_crisis_card);
    }

    #[test]
    fn test_context_skips_crisis_cards() {
        let mut store = ConversationStore::new();
        store.push(Turn::user("one"));
        store.push(Turn::crisis_card("<div>card</div>"));
        store.push(Turn::user("two"));

        let texts: Vec<_> = store.context().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec![GREETING, "one", "two"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_ends_with_user() {
        let mut store = ConversationStore::new();
        assert!(!store.ends_with_user());
        store.push(Turn::user("hi"));
        assert!(store.ends_with_user());
        store.push(Turn::assistant("hello"));
        assert!(!store.ends_with_user());
    }

    #[test]
    fn test_reset_restores_greeting_only() {
        let mut store = ConversationStore::new();
        store.push(Turn::user("a"));
        store.push(Turn::assistant("b"));
        store.reset();
        assert_eq!(store.len(), 1);
        assert_eq!(store.turns()[0].text, GREETING);
    }

    #[test]
    fn test_wire_roles() {
        assert_eq!(Speaker::User.wire_role(), "user");
        assert_eq!(Speaker::Assistant.wire_role(), "model");
    }

    #[test]
    fn test_turn_json_shape() {
        let turn = Turn::crisis_card("card");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["speaker"], "assistant");
        assert_eq!(json["is_crisis_card"], true);
        assert!(json["created_at"].is_string());
    }
}
