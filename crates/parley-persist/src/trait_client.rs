use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ChatMessage, Conversation, ThreadStateToken};
use crate::error::Result;

/// Result of appending a batch of messages
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    /// Key the batch was stored under; newly allocated when none was given
    pub thread_key: String,
    /// Stored messages with author, timestamp and id filled in
    pub messages: Vec<ChatMessage>,
}

/// Durable append/query log of chat messages keyed by thread
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a batch, all or nothing. A missing key allocates a new one.
    async fn append(
        &self,
        thread_key: Option<&str>,
        messages: Vec<ChatMessage>,
    ) -> Result<AppendOutcome>;

    /// Newest `limit` messages, returned oldest first
    async fn fetch_recent(&self, thread_key: &str, limit: usize) -> Result<Vec<ChatMessage>>;

    /// Full history in chronological order (display only)
    async fn fetch_all(&self, thread_key: &str) -> Result<Vec<ChatMessage>>;

    /// Count messages stored under a key
    async fn count(&self, thread_key: &str) -> Result<u64>;

    /// Remove every message under a key; unknown or absent keys remove nothing
    async fn delete_by_thread(&self, thread_key: Option<&str>) -> Result<u64>;
}

/// CRUD over conversation metadata records
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create(&self, title: Option<String>) -> Result<Conversation>;

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// All conversations in creation order
    async fn list(&self) -> Result<Vec<Conversation>>;

    /// Replace title and thread state; creation time never changes
    async fn update(&self, conversation: &Conversation) -> Result<()>;

    /// Write only the title field
    async fn update_title(&self, id: Uuid, title: &str) -> Result<()>;

    /// Write only the thread-state token
    async fn update_thread_state(&self, id: Uuid, token: &ThreadStateToken) -> Result<()>;

    /// Delete the conversation and its history atomically.
    ///
    /// Returns the number of history rows removed.
    async fn delete(&self, id: Uuid) -> Result<u64>;
}

/// A backend holding both conversations and their history, so that cascade
/// deletes can share one transaction.
#[async_trait]
pub trait PersistenceClient: ConversationRepository + MessageStore {
    fn backend_name(&self) -> &'static str;

    /// Cheap reachability probe
    async fn ping(&self) -> Result<()>;
}
