//! Thread-state token codec.
//!
//! A stored token is the agent runtime's serialized thread: a JSON object
//! whose `storeState` field holds the history storage key. The codec is the
//! only place that peeks inside it, and every accessor is total: malformed or
//! foreign-shaped blobs read as "no key" instead of failing the caller.

use serde_json::{Map, Value};

use crate::models::ThreadStateToken;

const STORE_STATE_FIELD: &str = "storeState";

/// Live handle on a thread, produced from a stored token
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadHandle {
    storage_key: Option<String>,
    origin: ThreadStateToken,
}

impl ThreadHandle {
    /// Handle with no prior history
    pub fn fresh() -> Self {
        Self {
            storage_key: None,
            origin: ThreadStateToken::Empty,
        }
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn is_fresh(&self) -> bool {
        self.storage_key.is_none()
    }

    /// Bind the key the message store allocated for this thread
    pub fn bind_storage_key(&mut self, key: impl Into<String>) {
        self.storage_key = Some(key.into());
    }
}

pub struct ThreadStateCodec;

impl ThreadStateCodec {
    /// Produce a handle from a stored token; the empty sentinel and unreadable
    /// blobs give a handle without a storage key.
    pub fn resolve(token: &ThreadStateToken) -> ThreadHandle {
        ThreadHandle {
            storage_key: Self::extract_storage_key(token),
            origin: token.clone(),
        }
    }

    /// Token to persist after a turn.
    ///
    /// An unchanged handle gives back the exact token it was resolved from.
    /// A newly bound key is written into the original object when it was
    /// one, keeping any fields this layer does not own.
    pub fn reify(handle: &ThreadHandle) -> ThreadStateToken {
        let Some(key) = handle.storage_key.as_deref() else {
            return handle.origin.clone();
        };

        if Self::extract_storage_key(&handle.origin).as_deref() == Some(key) {
            return handle.origin.clone();
        }

        let mut object = match &handle.origin {
            ThreadStateToken::Opaque(blob) => match serde_json::from_str::<Value>(blob) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            ThreadStateToken::Empty => Map::new(),
        };
        object.insert(STORE_STATE_FIELD.to_string(), Value::String(key.to_string()));

        ThreadStateToken::Opaque(Value::Object(object).to_string())
    }

    /// Storage key scoping this thread's history rows, if the token has one
    pub fn extract_storage_key(token: &ThreadStateToken) -> Option<String> {
        let ThreadStateToken::Opaque(blob) = token else {
            return None;
        };

        let value: Value = serde_json::from_str(blob).ok()?;
        match value.get(STORE_STATE_FIELD)? {
            Value::String(key) if !key.trim().is_empty() => Some(key.clone()),
            _ => None,
        }
    }
}
