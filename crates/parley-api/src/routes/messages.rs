use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use parley_conversation::MessageView;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::parse_conversation_id;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

impl SendMessageRequest {
    pub(crate) fn validated(self) -> ApiResult<String> {
        if self.content.trim().is_empty() {
            return Err(ApiError::BadRequest("Message content must not be empty".to_string()));
        }
        Ok(self.content)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// `user` or `assistant`
    pub role: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub message_id: String,
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        Self {
            role: view.role.as_str().to_string(),
            author: view.author,
            created_at: view.created_at,
            content: view.content,
            message_id: view.message_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationMessagesResponse {
    pub conversation_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageResponse>,
}

/// Full message history of a conversation, oldest first
#[utoipa::path(
    get,
    path = "/conversations/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation with its messages", body = ConversationMessagesResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConversationMessagesResponse>> {
    let id = parse_conversation_id(&id)?;
    let detail = state.service.get_conversation(id).await?;

    Ok(Json(ConversationMessagesResponse {
        conversation_id: detail.conversation.id,
        title: detail.conversation.title,
        created_at: detail.conversation.created_at,
        messages: detail.messages.into_iter().map(Into::into).collect(),
    }))
}

/// Send a message and wait for the full reply
#[utoipa::path(
    post,
    path = "/conversations/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = SendMessageResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "messages"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let id = parse_conversation_id(&id)?;
    let content = req.validated()?;

    let response = state.service.send_message(id, &content).await?;

    Ok(Json(SendMessageResponse { response }))
}
