use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_conversation::ConversationError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conversation error: {0}")]
    Conversation(ConversationError),
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NotFound(id) => ApiError::ConversationNotFound(id.to_string()),
            other => ApiError::Conversation(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conversation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client; internal causes are logged instead
    pub fn public_message(&self) -> String {
        match self {
            ApiError::ConversationNotFound(_) | ApiError::BadRequest(_) => self.to_string(),
            ApiError::Conversation(ConversationError::Agent(e)) => {
                tracing::error!("Agent error: {}", e);
                "Processing error".to_string()
            }
            ApiError::Conversation(e) => {
                tracing::error!("Storage error: {}", e);
                "Storage error".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.public_message()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
