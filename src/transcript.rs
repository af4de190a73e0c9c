//! Append-only conversation transcript.
//!
//! The [`Transcript`] is the only history the completion service ever sees.
//! It always opens with the system message carrying the assistant's
//! behavioral contract, and grows strictly by appending. Corrections are
//! recorded as new messages, never by editing earlier ones.

use crate::message::{Message, Role};

/// Ordered, append-only list of messages for one chat session.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Starts a transcript containing only the system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Adds a message to the end of the transcript.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Read-only view of the full ordered history.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// The behavioral contract every transcript opens with.
    pub fn system_prompt(&self) -> &str {
        // Invariant: index 0 is set in `new` and nothing removes it.
        self.messages[0].text()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Messages the user should see when replaying history (everything but
    /// the opening contract).
    pub fn conversation(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().skip(1)
    }

    /// Number of messages with the given role.
    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transcript_opens_with_system_prompt() {
        let transcript = Transcript::new("be helpful");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.snapshot()[0].role, Role::System);
        assert_eq!(transcript.system_prompt(), "be helpful");
        assert_eq!(transcript.conversation().count(), 0);
    }

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let mut transcript = Transcript::new("sys");
        transcript.append(Message::user("hello"));
        transcript.append(Message::user("hello"));
        transcript.append(Message::assistant("hi"));

        let texts: Vec<&str> = transcript.snapshot().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["sys", "hello", "hello", "hi"]);
        assert_eq!(transcript.count_role(Role::User), 2);
        assert_eq!(transcript.snapshot().last().map(|m| m.text()), Some("hi"));
    }
}
