//! In-memory chat sessions.
//!
//! A [`ChatSession`] owns the transcript for one conversation. It is created
//! when a chat starts, passed by `&mut` through every turn, and dropped when
//! the chat ends. Nothing is written to disk.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::transcript::Transcript;

/// A single conversation and its transcript.
pub struct ChatSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub transcript: Transcript,
}

impl ChatSession {
    /// Creates a new session whose transcript opens with `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            transcript: Transcript::new(system_prompt),
        }
    }

    /// Git-style short id for display and log fields.
    pub fn short_id(&self) -> &str {
        &self.id[..8]
    }

    /// Discards the conversation and starts over with the same system prompt.
    ///
    /// This is the only operation that drops history. The session id is
    /// regenerated because the new transcript is a new conversation.
    pub fn reset(&mut self) {
        let system_prompt = self.transcript.system_prompt().to_string();
        *self = Self::new(system_prompt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_reset_keeps_only_system_prompt() {
        let mut session = ChatSession::new("contract");
        let first_id = session.id.clone();
        session.transcript.append(Message::user("what's playing?"));
        session.transcript.append(Message::assistant("Dune"));

        session.reset();

        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript.system_prompt(), "contract");
        assert_ne!(session.id, first_id);
    }

    #[test]
    fn test_short_id_is_prefix() {
        let session = ChatSession::new("contract");
        assert_eq!(session.short_id().len(), 8);
        assert!(session.id.starts_with(session.short_id()));
    }
}
