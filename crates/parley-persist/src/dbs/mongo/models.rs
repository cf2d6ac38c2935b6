use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::error::{PersistError, Result};
use crate::models::{ChatHistoryItem, Conversation, ThreadStateToken};

/// MongoDB-specific conversation document (string ids, BSON dates)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub thread_state: String,
}

/// MongoDB-specific history document; the sequence number doubles as `_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoHistoryItem {
    #[serde(rename = "_id")]
    pub seq: i64,
    pub key: String,
    pub thread_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    pub serialized_message: String,
    pub message_text: String,
}

/// Named monotonic counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounter {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i64,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<&Conversation> for MongoConversation {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.to_string(),
            title: conversation.title.clone(),
            created_at: conversation.created_at,
            thread_state: conversation.thread_state.as_str().to_string(),
        }
    }
}

impl TryFrom<MongoConversation> for Conversation {
    type Error = PersistError;

    fn try_from(doc: MongoConversation) -> Result<Self> {
        let id = Uuid::parse_str(&doc.id)
            .map_err(|e| PersistError::Internal(format!("invalid conversation id {}: {}", doc.id, e)))?;
        Ok(Self {
            id,
            title: doc.title,
            created_at: doc.created_at,
            thread_state: ThreadStateToken::from(doc.thread_state),
        })
    }
}

impl From<ChatHistoryItem> for MongoHistoryItem {
    fn from(item: ChatHistoryItem) -> Self {
        Self {
            seq: item.seq,
            key: item.key,
            thread_id: item.thread_id,
            timestamp: item.timestamp,
            serialized_message: item.serialized_message,
            message_text: item.message_text,
        }
    }
}

impl From<MongoHistoryItem> for ChatHistoryItem {
    fn from(doc: MongoHistoryItem) -> Self {
        Self {
            seq: doc.seq,
            key: doc.key,
            thread_id: doc.thread_id,
            timestamp: doc.timestamp,
            serialized_message: doc.serialized_message,
            message_text: doc.message_text,
        }
    }
}
