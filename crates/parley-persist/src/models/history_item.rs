use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::ChatMessage;
use crate::error::{PersistError, Result};

/// Immutable history row; one per message produced by either party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    /// Monotonic insertion sequence, breaks timestamp ties
    pub seq: i64,
    /// `{thread_id}-{message_id}`
    pub key: String,
    pub thread_id: String,
    pub timestamp: DateTime<Utc>,
    pub serialized_message: String,
    pub message_text: String,
}

impl ChatHistoryItem {
    /// Build a row from a message whose defaults are already filled
    pub fn from_message(thread_id: &str, seq: i64, message: &ChatMessage) -> Result<Self> {
        let (Some(message_id), Some(timestamp)) = (&message.message_id, message.created_at) else {
            return Err(PersistError::Internal(
                "message defaults must be filled before storing".to_string(),
            ));
        };

        Ok(Self {
            seq,
            key: format!("{}-{}", thread_id, message_id),
            thread_id: thread_id.to_string(),
            timestamp,
            serialized_message: serde_json::to_string(message)?,
            message_text: message.text(),
        })
    }

    pub fn to_message(&self) -> Result<ChatMessage> {
        Ok(serde_json::from_str(&self.serialized_message)?)
    }
}
