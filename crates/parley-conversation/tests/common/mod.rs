mod client;
mod store;

use std::sync::Arc;

use parley_agent::{AgentProfile, AgentSession};
use parley_conversation::{ConversationService, TitleGenerator};
use parley_persist::PersistenceClient;

pub use client::{Reply, ScriptedClient};
pub use store::CountingStore;

pub struct Harness {
    pub service: ConversationService,
    pub store: Arc<CountingStore>,
    pub chat: Arc<ScriptedClient>,
    pub titler: Arc<ScriptedClient>,
}

/// Service over the memory backend with separate chat and title backends
pub fn harness(chat_replies: Vec<Reply>, title_replies: Vec<Reply>) -> Harness {
    let store = Arc::new(CountingStore::default());
    let chat = Arc::new(ScriptedClient::new(chat_replies));
    let titler = Arc::new(ScriptedClient::new(title_replies));

    let persistence: Arc<dyn PersistenceClient> = store.clone();
    let chat_agent = AgentSession::new(chat.clone(), AgentProfile::chat()).with_history(persistence.clone());
    let titles = TitleGenerator::new(
        AgentSession::new(titler.clone(), AgentProfile::title_generator()),
        persistence.clone(),
    );

    Harness {
        service: ConversationService::new(persistence, chat_agent, titles),
        store,
        chat,
        titler,
    }
}

pub fn text(reply: &str) -> Reply {
    Reply::Text(reply.to_string())
}
