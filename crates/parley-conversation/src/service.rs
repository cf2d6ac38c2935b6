use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use parley_agent::{AgentProfile, AgentSession, TurnOutcome};
use parley_llm::ChatClient;
use parley_persist::{
    ChatMessage, Conversation, PersistenceClient, ThreadHandle, ThreadStateCodec,
};
use uuid::Uuid;

use crate::error::{ConversationError, Result};
use crate::title::TitleGenerator;
use crate::view::{ConversationDetail, ConversationSummary, MessageView};

/// Reply deltas of a streamed turn
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Drives a conversation turn from the stored token to the persisted reply.
///
/// Every call re-reads the durable store; nothing about a conversation is
/// cached between requests.
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn PersistenceClient>,
    chat: AgentSession,
    titles: TitleGenerator,
}

impl ConversationService {
    /// `chat` should already carry `store` as its history
    pub fn new(store: Arc<dyn PersistenceClient>, chat: AgentSession, titles: TitleGenerator) -> Self {
        Self { store, chat, titles }
    }

    /// Chat and title agents sharing one backend client
    pub fn from_profiles(
        store: Arc<dyn PersistenceClient>,
        client: Arc<dyn ChatClient>,
        chat_profile: AgentProfile,
        title_profile: AgentProfile,
    ) -> Self {
        let chat = AgentSession::new(Arc::clone(&client), chat_profile).with_history(Arc::clone(&store));
        let titles = TitleGenerator::new(AgentSession::new(client, title_profile), Arc::clone(&store));
        Self::new(store, chat, titles)
    }

    pub fn titles(&self) -> &TitleGenerator {
        &self.titles
    }

    pub fn store(&self) -> &Arc<dyn PersistenceClient> {
        &self.store
    }

    pub async fn create_conversation(&self, title: Option<String>) -> Result<Conversation> {
        let conversation = self.store.create(title).await?;
        tracing::info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.store.list().await?)
    }

    /// Listing with per-conversation message counts; no bound key counts zero
    pub async fn list_summaries(&self) -> Result<Vec<ConversationSummary>> {
        let conversations = self.store.list().await?;
        let mut summaries = Vec::with_capacity(conversations.len());

        for conversation in conversations {
            let message_count = match ThreadStateCodec::extract_storage_key(&conversation.thread_state) {
                Some(key) => self.store.count(&key).await?,
                None => 0,
            };
            summaries.push(ConversationSummary {
                conversation,
                message_count,
            });
        }

        Ok(summaries)
    }

    pub async fn get(&self, id: Uuid) -> Result<Conversation> {
        self.store
            .get(id)
            .await?
            .ok_or(ConversationError::NotFound(id))
    }

    /// Metadata plus the full, unwindowed history
    pub async fn get_conversation(&self, id: Uuid) -> Result<ConversationDetail> {
        let conversation = self.get(id).await?;

        let messages = match ThreadStateCodec::extract_storage_key(&conversation.thread_state) {
            Some(key) => self.store.fetch_all(&key).await?,
            None => Vec::new(),
        };

        Ok(ConversationDetail {
            conversation,
            messages: messages.into_iter().map(MessageView::from).collect(),
        })
    }

    /// Blocking turn; returns the assistant's reply text
    pub async fn send_message(&self, id: Uuid, text: &str) -> Result<String> {
        let handle = self.begin_turn(id, text).await?;

        let outcome = self.chat.run_turn(&handle, text).await.map_err(|e| {
            tracing::warn!(conversation_id = %id, error = %e, "Turn failed");
            ConversationError::from(e)
        })?;

        commit_turn(self.store.as_ref(), id, &outcome).await?;
        Ok(outcome.text)
    }

    /// Streamed turn.
    ///
    /// Lookup and the user-message append happen before this returns, along
    /// with binding a newly allocated storage key. The reply and the turn's
    /// token are persisted only once the returned stream has been drained;
    /// dropping it early or a backend failure commits nothing further.
    pub async fn stream_message(&self, id: Uuid, text: &str) -> Result<DeltaStream> {
        let handle = self.begin_turn(id, text).await?;
        let mut turn = self.chat.stream_turn(&handle, text).await?;
        let store = Arc::clone(&self.store);

        Ok(Box::pin(async_stream::stream! {
            while let Some(delta) = turn.next().await {
                match delta {
                    Ok(chunk) => {
                        yield Ok(chunk);
                    }
                    Err(e) => {
                        tracing::warn!(conversation_id = %id, error = %e, "Streamed turn failed");
                        yield Err(ConversationError::from(e));
                        return;
                    }
                }
            }

            let committed = match turn.finish() {
                Ok(outcome) => commit_turn(store.as_ref(), id, &outcome).await,
                Err(e) => Err(ConversationError::from(e)),
            };
            if let Err(e) = committed {
                yield Err(e);
            }
        }))
    }

    /// Remove the conversation and its history in one atomic step
    pub async fn delete_conversation(&self, id: Uuid) -> Result<()> {
        let removed = self.store.delete(id).await?;
        tracing::info!(conversation_id = %id, count = removed, "Conversation deleted");
        Ok(())
    }

    async fn begin_turn(&self, id: Uuid, text: &str) -> Result<ThreadHandle> {
        let conversation = self.get(id).await?;
        let mut handle = ThreadStateCodec::resolve(&conversation.thread_state);

        let appended = self
            .store
            .append(handle.storage_key(), vec![ChatMessage::user(text)])
            .await?;
        tracing::debug!(
            conversation_id = %id,
            thread_key = %appended.thread_key,
            "User message stored"
        );

        if handle.is_fresh() {
            // the token carries the key before the agent runs
            handle.bind_storage_key(appended.thread_key);
            let token = ThreadStateCodec::reify(&handle);
            self.store.update_thread_state(id, &token).await?;
            handle = ThreadStateCodec::resolve(&token);
        }

        if conversation.is_untouched() {
            self.titles.maybe_generate(id, text);
        }

        Ok(handle)
    }
}

async fn commit_turn(store: &dyn PersistenceClient, id: Uuid, outcome: &TurnOutcome) -> Result<()> {
    let key = outcome.handle.storage_key();
    store
        .append(key, vec![ChatMessage::assistant(outcome.text.as_str())])
        .await?;

    let token = ThreadStateCodec::reify(&outcome.handle);
    store.update_thread_state(id, &token).await?;
    tracing::debug!(conversation_id = %id, "Turn persisted");
    Ok(())
}
