use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use parley_conversation::ConversationSummary;
use parley_persist::Conversation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::parse_conversation_id;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title,
            created_at: conversation.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub message_count: u64,
}

impl From<ConversationSummary> for ConversationSummaryResponse {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            id: summary.conversation.id,
            title: summary.conversation.title,
            created_at: summary.conversation.created_at,
            message_count: summary.message_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationSummaryResponse>,
}

/// Create a new conversation
#[utoipa::path(
    post,
    path = "/conversations",
    request_body(content = CreateConversationRequest, description = "Optional initial title"),
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse)
    ),
    tag = "conversations"
)]
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateConversationRequest>>,
) -> ApiResult<(StatusCode, Json<ConversationResponse>)> {
    let Json(req) = body.unwrap_or_default();
    let conversation = state.service.create_conversation(req.title).await?;

    Ok((StatusCode::CREATED, Json(conversation.into())))
}

/// List all conversations in creation order with their message counts
#[utoipa::path(
    get,
    path = "/conversations",
    responses(
        (status = 200, description = "List of conversations", body = ListConversationsResponse)
    ),
    tag = "conversations"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ListConversationsResponse>> {
    let conversations = state.service.list_summaries().await?;

    Ok(Json(ListConversationsResponse {
        conversations: conversations.into_iter().map(Into::into).collect(),
    }))
}

/// Get a conversation's metadata
#[utoipa::path(
    get,
    path = "/conversations/{id}",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation details", body = ConversationResponse),
        (status = 400, description = "Malformed conversation ID"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConversationResponse>> {
    let id = parse_conversation_id(&id)?;
    let conversation = state.service.get(id).await?;

    Ok(Json(conversation.into()))
}

/// Delete a conversation and its message history
#[utoipa::path(
    delete,
    path = "/conversations/{id}",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    responses(
        (status = 204, description = "Conversation deleted"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_conversation_id(&id)?;
    state.service.delete_conversation(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
