pub mod models;
pub mod codec;
pub mod trait_client;
pub mod dbs;
pub mod error;
pub mod builder;

pub use models::{
    ChatHistoryItem, ChatMessage, ChatRole, Conversation, ThreadStateToken, DEFAULT_TITLE,
    EMPTY_THREAD_STATE,
};
pub use codec::{ThreadHandle, ThreadStateCodec};
pub use trait_client::{AppendOutcome, ConversationRepository, MessageStore, PersistenceClient};
pub use dbs::memory::MemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
pub use error::{PersistError, Result};
pub use builder::{Backend, PersistenceBuilder};

/// Window size used when the agent reads recent history
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;
