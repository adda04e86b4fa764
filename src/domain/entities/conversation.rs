use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of a chat message as sent by the client.
///
/// Anything other than `user` or `assistant` is kept verbatim so it can be
/// echoed back into the prompt unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    User,
    Assistant,
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Other(role) => role,
        }
    }

    /// Speaker label used when rendering history into a prompt.
    pub fn label(&self) -> &str {
        match self {
            Self::User => "Human",
            Self::Assistant => "Assistant",
            Self::Other(role) => role,
        }
    }
}

impl From<String> for MessageRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            _ => Self::Other(role),
        }
    }
}

impl From<&str> for MessageRole {
    fn from(role: &str) -> Self {
        Self::from(role.to_string())
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::Other(role) => role,
            other => other.as_str().to_string(),
        }
    }
}

/// Renders chat history as `"<Label>: <content>"` lines joined by `\n`.
pub fn format_chat_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The current question plus the conversation that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationalQuery {
    pub question: String,
    pub chat_history: Vec<ChatMessage>,
}

impl ConversationalQuery {
    pub fn new(question: impl Into<String>, chat_history: Vec<ChatMessage>) -> Self {
        Self {
            question: question.into(),
            chat_history,
        }
    }

    /// Splits a message list into history and the final (current) message.
    pub fn from_messages(mut messages: Vec<ChatMessage>) -> Result<Self, DomainError> {
        let current = messages
            .pop()
            .ok_or_else(|| DomainError::validation("messages must not be empty"))?;

        // Intentionally stricter than an empty-list check: a whitespace-only
        // final message is also a client error.
        if current.content.trim().is_empty() {
            return Err(DomainError::validation(
                "the last message must have non-empty content",
            ));
        }

        Ok(Self {
            question: current.content,
            chat_history: messages,
        })
    }

    pub fn formatted_history(&self) -> String {
        format_chat_history(&self.chat_history)
    }
}
