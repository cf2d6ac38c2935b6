use serde::{Deserialize, Serialize};

/// Stored form of a thread that has never persisted a message
pub const EMPTY_THREAD_STATE: &str = "{}";

/// Opaque serialized thread state carried on a conversation.
///
/// Only `ThreadStateCodec` looks inside `Opaque`; everything else moves it
/// around as an uninterpreted string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreadStateToken {
    #[default]
    Empty,
    Opaque(String),
}

impl ThreadStateToken {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Stored string form
    pub fn as_str(&self) -> &str {
        match self {
            Self::Empty => EMPTY_THREAD_STATE,
            Self::Opaque(blob) => blob,
        }
    }
}

impl From<String> for ThreadStateToken {
    fn from(blob: String) -> Self {
        let trimmed = blob.trim();
        if trimmed.is_empty() || trimmed == EMPTY_THREAD_STATE || trimmed == "null" {
            Self::Empty
        } else {
            Self::Opaque(blob)
        }
    }
}

impl From<&str> for ThreadStateToken {
    fn from(blob: &str) -> Self {
        Self::from(blob.to_string())
    }
}

impl From<ThreadStateToken> for String {
    fn from(token: ThreadStateToken) -> Self {
        match token {
            ThreadStateToken::Empty => EMPTY_THREAD_STATE.to_string(),
            ThreadStateToken::Opaque(blob) => blob,
        }
    }
}
