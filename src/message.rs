//! Message types for the conversation transcript.
//!
//! Provides a structured [`Message`] with a [`Role`] tag. These are marquee's
//! internal types, converted to provider-specific formats (e.g. rig-core's
//! `Message`) when sent to the LLM.

use serde::{Deserialize, Serialize};

/// A single message in a conversation.
///
/// `action_name` is only set on [`Role::ActionResult`] messages so the model
/// can tell which action produced the result it is reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
}

/// The role of a message sender in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    ActionResult,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            action_name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Creates an action result message tagged with the action that produced it.
    pub fn action_result(action: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::ActionResult,
            content: content.into(),
            action_name: Some(action.into()),
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ActionResult => write!(f, "action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_result_carries_name() {
        let msg = Message::action_result("get_showtimes", "7 PM at AMC");
        assert_eq!(msg.role, Role::ActionResult);
        assert_eq!(msg.action_name.as_deref(), Some("get_showtimes"));
        assert_eq!(msg.text(), "7 PM at AMC");
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&Message::action_result("get_reviews", "ok")).unwrap();
        assert!(json.contains("\"role\":\"action_result\""));
        let plain = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(!plain.contains("action_name"));
    }
}
