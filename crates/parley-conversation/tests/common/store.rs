use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parley_persist::{
    AppendOutcome, ChatMessage, Conversation, ConversationRepository, MemoryPersistenceClient,
    MessageStore, PersistenceClient, Result, ThreadStateToken,
};
use uuid::Uuid;

/// Memory backend that counts every write it receives
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryPersistenceClient,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageStore for CountingStore {
    async fn append(&self, thread_key: Option<&str>, messages: Vec<ChatMessage>) -> Result<AppendOutcome> {
        self.record();
        self.inner.append(thread_key, messages).await
    }

    async fn fetch_recent(&self, thread_key: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        self.inner.fetch_recent(thread_key, limit).await
    }

    async fn fetch_all(&self, thread_key: &str) -> Result<Vec<ChatMessage>> {
        self.inner.fetch_all(thread_key).await
    }

    async fn count(&self, thread_key: &str) -> Result<u64> {
        self.inner.count(thread_key).await
    }

    async fn delete_by_thread(&self, thread_key: Option<&str>) -> Result<u64> {
        self.record();
        self.inner.delete_by_thread(thread_key).await
    }
}

#[async_trait]
impl ConversationRepository for CountingStore {
    async fn create(&self, title: Option<String>) -> Result<Conversation> {
        self.record();
        self.inner.create(title).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Conversation>> {
        self.inner.list().await
    }

    async fn update(&self, conversation: &Conversation) -> Result<()> {
        self.record();
        self.inner.update(conversation).await
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<()> {
        self.record();
        self.inner.update_title(id, title).await
    }

    async fn update_thread_state(&self, id: Uuid, token: &ThreadStateToken) -> Result<()> {
        self.record();
        self.inner.update_thread_state(id, token).await
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        self.record();
        self.inner.delete(id).await
    }
}

#[async_trait]
impl PersistenceClient for CountingStore {
    fn backend_name(&self) -> &'static str {
        "counting-memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
