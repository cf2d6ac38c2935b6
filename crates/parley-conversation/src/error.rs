use parley_agent::AgentError;
use parley_persist::PersistError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Conversation not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Agent(AgentError),

    #[error(transparent)]
    Persist(PersistError),
}

impl ConversationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<PersistError> for ConversationError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ConversationNotFound(id) => Self::NotFound(id),
            other => Self::Persist(other),
        }
    }
}

impl From<AgentError> for ConversationError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Persist(persist) => persist.into(),
            other => Self::Agent(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversationError>;
