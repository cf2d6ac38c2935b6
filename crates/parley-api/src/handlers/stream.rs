use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    routes::{messages::SendMessageRequest, parse_conversation_id},
    state::AppState,
};

/// Send a message and stream the reply using Server-Sent Events
///
/// Each text delta is a `message` event with `{"content": ...}`; a finished
/// reply ends with an `end` event. Once the stream is open, failures arrive
/// as a single `error` event carrying `{"status", "error"}` and nothing
/// follows it.
#[utoipa::path(
    post,
    path = "/conversations/{id}/stream",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Streaming response", content_type = "text/event-stream"),
        (status = 400, description = "Invalid request")
    ),
    tag = "messages"
)]
pub async fn stream_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let id = parse_conversation_id(&id)?;
    let content = req.validated()?;

    let opened = state.service.stream_message(id, &content).await;

    let events = async_stream::stream! {
        match opened {
            Ok(mut deltas) => {
                while let Some(item) = deltas.next().await {
                    match item {
                        Ok(delta) => {
                            yield message_event(&delta);
                        }
                        Err(e) => {
                            yield error_event(&ApiError::from(e));
                            return;
                        }
                    }
                }
                yield end_event();
            }
            Err(e) => {
                yield error_event(&ApiError::from(e));
            }
        }
    };

    Ok(Sse::new(events.map(Ok)).keep_alive(KeepAlive::default()))
}

fn message_event(content: &str) -> Event {
    Event::default()
        .event("message")
        .json_data(serde_json::json!({ "content": content }))
        .unwrap_or_else(|_| Event::default().event("message").data(content))
}

fn error_event(err: &ApiError) -> Event {
    let status = err.status();
    tracing::warn!(status = %status, error = %err, "Stream ended with error");
    Event::default()
        .event("error")
        .json_data(serde_json::json!({
            "status": status.as_u16(),
            "error": err.public_message(),
        }))
        .unwrap_or_else(|_| Event::default().event("error").data(status.as_str()))
}

fn end_event() -> Event {
    Event::default().event("end").data("[DONE]")
}
