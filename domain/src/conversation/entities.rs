//! Conversation entities

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
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

/// A message in a conversation (Entity)
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

/// Bounded chat history
///
/// Holds at most `max_turns` user/assistant exchanges; the oldest exchange
/// is dropped first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
    max_turns: usize,
}

impl Conversation {
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.messages.push(Message::user(question));
        self.messages.push(Message::assistant(answer));
        while self.turns() > self.max_turns {
            self.drop_oldest_turn();
        }
    }

    fn drop_oldest_turn(&mut self) {
        // A turn starts at a user message and runs until the next one
        let next_user = self
            .messages
            .iter()
            .skip(1)
            .position(|m| m.role == Role::User)
            .map(|i| i + 1)
            .unwrap_or(self.messages.len());
        self.messages.drain(..next_user);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// `User:` / `Assistant:` transcript for embedding in prompts.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| match m.role {
                Role::User => format!("User: {}", m.content),
                Role::Assistant => format!("Assistant: {}", m.content),
                Role::System => format!("System: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript() {
        let mut c = Conversation::new(4);
        c.push_exchange("What is g2?", "The intensity autocorrelation.");
        assert_eq!(
            c.transcript(),
            "User: What is g2?\nAssistant: The intensity autocorrelation."
        );
    }

    #[test]
    fn test_drops_oldest_turns_first() {
        let mut c = Conversation::new(2);
        c.push_exchange("q1", "a1");
        c.push_exchange("q2", "a2");
        c.push_exchange("q3", "a3");
        assert_eq!(c.turns(), 2);
        assert_eq!(c.messages()[0], Message::user("q2"));
        assert_eq!(c.messages()[3], Message::assistant("a3"));
    }

    #[test]
    fn test_zero_turns_keeps_nothing() {
        let mut c = Conversation::new(0);
        c.push_exchange("q", "a");
        assert!(c.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut c = Conversation::default();
        c.push_exchange("q", "a");
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.transcript(), "");
    }
}
