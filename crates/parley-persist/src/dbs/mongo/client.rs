use mongodb::{Client, ClientSession, bson::doc};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::codec::ThreadStateCodec;
use crate::dbs::new_thread_key;
use crate::dbs::mongo::models::{MongoConversation, MongoHistoryItem};
use crate::dbs::mongo::repositories::{MongoConversationRepository, MongoHistoryRepository};
use crate::error::{PersistError, Result};
use crate::models::{ChatHistoryItem, ChatMessage, Conversation, ThreadStateToken};
use crate::trait_client::{AppendOutcome, ConversationRepository, MessageStore, PersistenceClient};

/// MongoDB backend.
///
/// Batch appends and cascade deletes run inside multi-document transactions,
/// so the server must be a replica set (a single-node one is enough).
pub struct MongoPersistenceClient {
    client: Client,
    database: String,
    conversation_repo: MongoConversationRepository,
    history_repo: MongoHistoryRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let conversation_repo = MongoConversationRepository::new(&client, database);
        let history_repo = MongoHistoryRepository::new(&client, database);
        history_repo.ensure_indexes().await?;

        tracing::info!(database = %database, "MongoDB persistence ready");

        Ok(Self {
            client,
            database: database.to_string(),
            conversation_repo,
            history_repo,
        })
    }

    async fn append_in_session(
        &self,
        thread_key: &str,
        messages: &[ChatMessage],
        session: &mut ClientSession,
    ) -> Result<()> {
        let first_seq = self.history_repo
            .reserve_sequence(messages.len() as i64, session)
            .await?;

        let items = messages
            .iter()
            .enumerate()
            .map(|(offset, message)| {
                ChatHistoryItem::from_message(thread_key, first_seq + offset as i64, message)
                    .map(MongoHistoryItem::from)
            })
            .collect::<Result<Vec<_>>>()?;

        self.history_repo.insert_many(items, session).await
    }

    async fn delete_in_session(&self, id: Uuid, session: &mut ClientSession) -> Result<u64> {
        let conversation: Conversation = self.conversation_repo
            .find_in_session(id, session)
            .await?
            .ok_or(PersistError::ConversationNotFound(id))?
            .try_into()?;

        let removed = match ThreadStateCodec::extract_storage_key(&conversation.thread_state) {
            Some(key) => self.history_repo.delete_thread_in_session(&key, session).await?,
            None => 0,
        };

        if !self.conversation_repo.delete_in_session(id, session).await? {
            return Err(PersistError::ConversationNotFound(id));
        }
        Ok(removed)
    }

    async fn commit_or_abort<T>(session: &mut ClientSession, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                session.commit_transaction().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::warn!("Failed to abort transaction: {}", abort_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl MessageStore for MongoPersistenceClient {
    async fn append(
        &self,
        thread_key: Option<&str>,
        messages: Vec<ChatMessage>,
    ) -> Result<AppendOutcome> {
        let thread_key = thread_key
            .map(str::to_string)
            .unwrap_or_else(new_thread_key);
        let now = Utc::now();

        let messages: Vec<ChatMessage> = messages
            .into_iter()
            .map(|mut message| {
                message.fill_defaults(now);
                message
            })
            .collect();

        if !messages.is_empty() {
            let mut session = self.client.start_session().await?;
            session.start_transaction().await?;
            let outcome = self.append_in_session(&thread_key, &messages, &mut session).await;
            Self::commit_or_abort(&mut session, outcome).await?;
        }

        tracing::debug!(thread_key = %thread_key, count = messages.len(), "appended messages");
        Ok(AppendOutcome {
            thread_key,
            messages,
        })
    }

    async fn fetch_recent(&self, thread_key: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut items = self.history_repo.find_recent(thread_key, limit).await?;
        items.reverse(); // Return in chronological order
        items
            .into_iter()
            .map(|doc| ChatHistoryItem::from(doc).to_message())
            .collect()
    }

    async fn fetch_all(&self, thread_key: &str) -> Result<Vec<ChatMessage>> {
        self.history_repo
            .find_all(thread_key)
            .await?
            .into_iter()
            .map(|doc| ChatHistoryItem::from(doc).to_message())
            .collect()
    }

    async fn count(&self, thread_key: &str) -> Result<u64> {
        self.history_repo.count(thread_key).await
    }

    async fn delete_by_thread(&self, thread_key: Option<&str>) -> Result<u64> {
        match thread_key {
            Some(key) => self.history_repo.delete_thread(key).await,
            None => Ok(0),
        }
    }
}

#[async_trait]
impl ConversationRepository for MongoPersistenceClient {
    async fn create(&self, title: Option<String>) -> Result<Conversation> {
        let conversation = Conversation::new(title);
        self.conversation_repo
            .insert(&MongoConversation::from(&conversation))
            .await?;
        Ok(conversation)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.conversation_repo
            .find(id)
            .await?
            .map(Conversation::try_from)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Conversation>> {
        self.conversation_repo
            .list()
            .await?
            .into_iter()
            .map(Conversation::try_from)
            .collect()
    }

    async fn update(&self, conversation: &Conversation) -> Result<()> {
        let fields = doc! {
            "title": conversation.title.as_str(),
            "thread_state": conversation.thread_state.as_str(),
        };
        if !self.conversation_repo.set_fields(conversation.id, fields).await? {
            return Err(PersistError::ConversationNotFound(conversation.id));
        }
        Ok(())
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<()> {
        if !self.conversation_repo.set_fields(id, doc! { "title": title }).await? {
            return Err(PersistError::ConversationNotFound(id));
        }
        Ok(())
    }

    async fn update_thread_state(&self, id: Uuid, token: &ThreadStateToken) -> Result<()> {
        let fields = doc! { "thread_state": token.as_str() };
        if !self.conversation_repo.set_fields(id, fields).await? {
            return Err(PersistError::ConversationNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        let outcome = self.delete_in_session(id, &mut session).await;
        Self::commit_or_abort(&mut session, outcome).await
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
