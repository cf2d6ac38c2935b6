use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::IntoResponse,
    Router,
};
use parley_api::{build_router, error::ApiError, AppState, Config};
use parley_conversation::ConversationService;
use parley_llm::{ChatClient, ChatRequest, ChatResponse, ChatStream, StreamEvent};
use parley_persist::{MemoryPersistenceClient, PersistenceClient};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Backend that answers every turn with the same chunks
struct EchoClient {
    chunks: Vec<&'static str>,
    titles: Mutex<VecDeque<&'static str>>,
}

#[async_trait]
impl ChatClient for EchoClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let text = if request.model == "title-model" {
            self.titles.lock().unwrap().pop_front().ok_or_else(|| anyhow!("no title"))?.to_string()
        } else {
            self.chunks.concat()
        };
        Ok(ChatResponse {
            content: Some(text),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn chat_stream(&self, _request: ChatRequest) -> Result<ChatStream> {
        let mut events: Vec<Result<StreamEvent>> = self
            .chunks
            .iter()
            .map(|c| Ok(StreamEvent::Message { content: c.to_string() }))
            .collect();
        events.push(Ok(StreamEvent::Done { finish_reason: None }));
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

fn app() -> (Router, ConversationService) {
    let config = Config::from_file("config/default.toml").unwrap();
    let store: Arc<dyn PersistenceClient> = Arc::new(MemoryPersistenceClient::new());
    let client = Arc::new(EchoClient {
        chunks: vec!["Hel", "lo ", "there"],
        titles: Mutex::new(VecDeque::from(vec!["Greetings"])),
    });

    let service = ConversationService::from_profiles(
        store,
        client,
        config.agents.chat_profile(),
        config.agents.title_profile().with_model("title-model"),
    );
    let state = Arc::new(AppState::new(config, service.clone()));
    (build_router(state), service)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router) -> String {
    let (status, body) = send_json(app, "POST", "/conversations", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_storage() {
    let (app, _) = app();
    let (status, body) = send_json(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["memory"], "connected");
}

#[tokio::test]
async fn test_create_and_list_conversations() {
    let (app, _) = app();

    let (status, created) = send_json(&app, "POST", "/conversations", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "New conversation");
    assert!(created["created_at"].is_string());

    let (status, titled) =
        send_json(&app, "POST", "/conversations", Some(json!({"title": "Groceries"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(titled["title"], "Groceries");

    let (status, listed) = send_json(&app, "GET", "/conversations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["conversations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_conversation_errors() {
    let (app, _) = app();

    let (status, _) = send_json(&app, "GET", "/conversations/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = send_json(&app, "GET", &format!("/conversations/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_send_message_and_read_history() {
    let (app, service) = app();
    let id = create(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/conversations/{id}/messages"),
        Some(json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Hello there");

    service.titles().drain().await;

    let (status, history) = send_json(&app, "GET", &format!("/conversations/{id}/messages"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["conversation_id"], id.as_str());
    assert_eq!(history["title"], "Greetings");

    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["author"], "User");
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello there");
    assert!(messages[1]["message_id"].is_string());
}

#[tokio::test]
async fn test_list_reports_message_counts() {
    let (app, service) = app();
    let talked = create(&app).await;
    let idle = create(&app).await;

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/conversations/{talked}/messages"),
        Some(json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    service.titles().drain().await;

    let (status, listed) = send_json(&app, "GET", "/conversations", None).await;
    assert_eq!(status, StatusCode::OK);

    let conversations = listed["conversations"].as_array().unwrap();
    let count_for = |id: &str| {
        conversations
            .iter()
            .find(|c| c["id"] == id)
            .map(|c| c["message_count"].as_u64().unwrap())
            .unwrap()
    };
    assert_eq!(count_for(talked.as_str()), 2);
    assert_eq!(count_for(idle.as_str()), 0);
}

#[tokio::test]
async fn test_send_message_validation_and_not_found() {
    let (app, _) = app();
    let id = create(&app).await;

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/conversations/{id}/messages"),
        Some(json!({"content": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/conversations/{missing}/messages"),
        Some(json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stream_emits_deltas_then_end() {
    let (app, _) = app();
    let id = create(&app).await;

    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/conversations/{id}/stream"),
        Some(json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = String::from_utf8(bytes).unwrap();
    assert_eq!(body.matches("event: message").count(), 3);
    assert!(body.contains(r#"data: {"content":"Hel"}"#));
    assert!(body.contains("event: end"));
    assert!(!body.contains("event: error"));

    let (_, history) = send_json(&app, "GET", &format!("/conversations/{id}/messages"), None).await;
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["content"], "Hello there");
}

#[tokio::test]
async fn test_stream_reports_missing_conversation_in_band() {
    let (app, _) = app();
    let missing = uuid::Uuid::new_v4();

    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/conversations/{missing}/stream"),
        Some(json!({"content": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = String::from_utf8(bytes).unwrap();
    assert!(body.contains("event: error"));
    assert!(body.contains(r#""status":404"#));
    assert!(!body.contains("event: end"));
}

#[tokio::test]
async fn test_delete_conversation() {
    let (app, _) = app();
    let id = create(&app).await;

    let (status, _) = send(&app, "DELETE", &format!("/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = app();
    let (status, doc) = send_json(&app, "GET", "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/conversations/{id}/stream"].is_object());
}

#[tokio::test]
async fn test_api_error_response() {
    let response = ApiError::BadRequest("Test error".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
