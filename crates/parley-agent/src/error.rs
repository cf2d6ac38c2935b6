use parley_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Turn stream read before it was drained")]
    StreamNotDrained,
}

pub type Result<T> = std::result::Result<T, AgentError>;
