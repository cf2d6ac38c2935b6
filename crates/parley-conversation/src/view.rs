use chrono::{DateTime, Utc};
use parley_persist::{ChatMessage, ChatRole, Conversation};
use serde::{Deserialize, Serialize};

/// Display projection of a stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub role: ChatRole,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub message_id: String,
}

impl From<ChatMessage> for MessageView {
    fn from(msg: ChatMessage) -> Self {
        let content = msg.text();
        Self {
            role: msg.role,
            author: msg
                .author_name
                .unwrap_or_else(|| msg.role.default_author().to_string()),
            created_at: msg.created_at.unwrap_or_else(Utc::now),
            content,
            message_id: msg.message_id.unwrap_or_default(),
        }
    }
}

/// Conversation metadata with its full history, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<MessageView>,
}

/// Listing entry: metadata plus the number of stored messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub message_count: u64,
}
