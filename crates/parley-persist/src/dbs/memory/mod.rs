use std::collections::HashMap;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::codec::ThreadStateCodec;
use crate::dbs::new_thread_key;
use crate::error::{PersistError, Result};
use crate::models::{ChatHistoryItem, ChatMessage, Conversation, ThreadStateToken};
use crate::trait_client::{AppendOutcome, ConversationRepository, MessageStore, PersistenceClient};

#[derive(Default)]
struct MemoryState {
    conversations: HashMap<Uuid, Conversation>,
    history: Vec<ChatHistoryItem>,
    next_seq: i64,
}

impl MemoryState {
    fn thread_items(&self, thread_key: &str) -> Vec<&ChatHistoryItem> {
        let mut items: Vec<&ChatHistoryItem> = self.history
            .iter()
            .filter(|item| item.thread_id == thread_key)
            .collect();
        items.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.seq.cmp(&b.seq)));
        items
    }

    fn remove_thread(&mut self, thread_key: &str) -> u64 {
        let before = self.history.len();
        self.history.retain(|item| item.thread_id != thread_key);
        (before - self.history.len()) as u64
    }
}

/// Process-local backend; one lock covers conversations and history so every
/// operation, the cascade delete included, is atomic.
#[derive(Default)]
pub struct MemoryPersistenceClient {
    state: RwLock<MemoryState>,
}

impl MemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }
}

fn decode(items: Vec<&ChatHistoryItem>) -> Result<Vec<ChatMessage>> {
    items.into_iter().map(ChatHistoryItem::to_message).collect()
}

#[async_trait]
impl MessageStore for MemoryPersistenceClient {
    async fn append(
        &self,
        thread_key: Option<&str>,
        messages: Vec<ChatMessage>,
    ) -> Result<AppendOutcome> {
        let thread_key = thread_key
            .map(str::to_string)
            .unwrap_or_else(new_thread_key);
        let now = Utc::now();

        let mut state = self.state.write().await;

        // Build every row before touching state so a failure stores nothing
        let mut stored = Vec::with_capacity(messages.len());
        let mut rows = Vec::with_capacity(messages.len());
        for (offset, mut message) in messages.into_iter().enumerate() {
            message.fill_defaults(now);
            rows.push(ChatHistoryItem::from_message(
                &thread_key,
                state.next_seq + offset as i64 + 1,
                &message,
            )?);
            stored.push(message);
        }

        state.next_seq += rows.len() as i64;
        state.history.extend(rows);

        tracing::debug!(thread_key = %thread_key, count = stored.len(), "appended messages");
        Ok(AppendOutcome {
            thread_key,
            messages: stored,
        })
    }

    async fn fetch_recent(&self, thread_key: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let state = self.state.read().await;
        let items = state.thread_items(thread_key);
        let skip = items.len().saturating_sub(limit);
        decode(items.into_iter().skip(skip).collect())
    }

    async fn fetch_all(&self, thread_key: &str) -> Result<Vec<ChatMessage>> {
        let state = self.state.read().await;
        decode(state.thread_items(thread_key))
    }

    async fn count(&self, thread_key: &str) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.history.iter().filter(|item| item.thread_id == thread_key).count() as u64)
    }

    async fn delete_by_thread(&self, thread_key: Option<&str>) -> Result<u64> {
        let Some(thread_key) = thread_key else {
            return Ok(0);
        };
        Ok(self.state.write().await.remove_thread(thread_key))
    }
}

#[async_trait]
impl ConversationRepository for MemoryPersistenceClient {
    async fn create(&self, title: Option<String>) -> Result<Conversation> {
        let conversation = Conversation::new(title);
        self.state
            .write()
            .await
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.state.read().await.conversations.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Conversation>> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state.conversations.values().cloned().collect();
        conversations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(conversations)
    }

    async fn update(&self, conversation: &Conversation) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .conversations
            .get_mut(&conversation.id)
            .ok_or(PersistError::ConversationNotFound(conversation.id))?;
        stored.title = conversation.title.clone();
        stored.thread_state = conversation.thread_state.clone();
        Ok(())
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .conversations
            .get_mut(&id)
            .ok_or(PersistError::ConversationNotFound(id))?;
        stored.title = title.to_string();
        Ok(())
    }

    async fn update_thread_state(&self, id: Uuid, token: &ThreadStateToken) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .conversations
            .get_mut(&id)
            .ok_or(PersistError::ConversationNotFound(id))?;
        stored.thread_state = token.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .remove(&id)
            .ok_or(PersistError::ConversationNotFound(id))?;

        let removed = match ThreadStateCodec::extract_storage_key(&conversation.thread_state) {
            Some(key) => state.remove_thread(&key),
            None => 0,
        };
        Ok(removed)
    }
}

#[async_trait]
impl PersistenceClient for MemoryPersistenceClient {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
