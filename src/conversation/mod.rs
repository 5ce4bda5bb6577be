// Conversation session helpers
//
// History is caller-owned state: the router itself is a pure function
// over it. The server keeps one history per active call.

use serde::{Deserialize, Serialize};

/// Greeting spoken on the first turn of every call
pub const GREETING: &str =
    "Namaste, I am Vaani from the city grievance helpline. How can I help you today?";

const MAX_TURNS: usize = 20;
const TRIM_TO: usize = 18;

const CONFIRM_WORDS: &[&str] = &[
    "yes", "yeah", "yep", "please", "confirm", "sure", "okay", "ok", "proceed", "haan",
];

// Matched as substrings since they span word boundaries
const CONFIRM_PHRASES: &[&str] = &["go ahead", "ji haan", "theek hai"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered turn list for one call, capped so long calls don't grow the
/// prompt without bound.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh history that already contains the spoken greeting
    pub fn with_greeting() -> Self {
        let mut history = Self::new();
        history.push_assistant(GREETING);
        history
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Turn {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        if self.turns.len() > MAX_TURNS {
            let excess = self.turns.len() - TRIM_TO;
            self.turns.drain(..excess);
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent user utterance, if any
    pub fn latest_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
    }
}

/// Whether an utterance reads as explicit assent. Single keywords match
/// whole words only, so "broken" does not read as "ok".
pub fn detect_confirmation(text: &str) -> bool {
    let lower = text.to_lowercase();
    if CONFIRM_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| CONFIRM_WORDS.contains(&word))
}
