use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ThreadStateToken;

/// Title every conversation starts with until one is generated
pub const DEFAULT_TITLE: &str = "New conversation";

/// Conversation metadata record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub thread_state: ThreadStateToken,
}

impl Conversation {
    pub fn new(title: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            created_at: Utc::now(),
            thread_state: ThreadStateToken::Empty,
        }
    }

    /// True until the first turn persists a thread token
    pub fn is_untouched(&self) -> bool {
        self.title == DEFAULT_TITLE && self.thread_state.is_empty()
    }
}
