use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use parley_llm::{Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn default_author(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Structured chat message, stored whole as the history payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            author_name: None,
            created_at: None,
            message_id: None,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Plain-text projection of the content
    pub fn text(&self) -> String {
        self.content.clone()
    }

    /// Fill author, timestamp and id where absent; present values are kept.
    pub fn fill_defaults(&mut self, now: DateTime<Utc>) {
        if self.author_name.is_none() {
            self.author_name = Some(self.role.default_author().to_string());
        }
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        if self.message_id.is_none() {
            self.message_id = Some(uuid::Uuid::new_v4().simple().to_string());
        }
    }
}

impl From<ChatRole> for Role {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => Role::User,
            ChatRole::Assistant => Role::Assistant,
        }
    }
}

impl From<&ChatMessage> for Message {
    fn from(msg: &ChatMessage) -> Self {
        Message {
            role: msg.role.into(),
            content: msg.content.clone(),
            name: msg.author_name.clone(),
        }
    }
}
