//! Answer generation capability.
//!
//! The relay talks to the hosted chat model only through [`AnswerGenerator`].
//! Every request is exactly one system message followed by one user message.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RelayError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message, serialized in the OpenAI wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
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
}

/// Build the two-message conversation sent for every question.
pub fn build_messages(system_instruction: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_instruction),
        ChatMessage::user(question),
    ]
}

/// A hosted conversational model.
///
/// Implementations sample deterministically (temperature 0), do not stream,
/// and do not retry. Any failure is a [`RelayError::GenerationService`].
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-3.5-turbo"`).
    fn model_name(&self) -> &str;

    /// Generate an answer to `question` under `system_instruction`.
    async fn generate(
        &self,
        system_instruction: &str,
        question: &str,
    ) -> Result<String, RelayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_order() {
        let msgs = build_messages("be helpful", "What are the rules?");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[0].content, "be helpful");
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[1].content, "What are the rules?");
    }

    #[test]
    fn test_message_wire_shape() {
        let json = serde_json::to_value(ChatMessage::system("x")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "system", "content": "x" }));
        let json = serde_json::to_value(ChatMessage::user("q")).unwrap();
        assert_eq!(json["role"], "user");
    }
}
