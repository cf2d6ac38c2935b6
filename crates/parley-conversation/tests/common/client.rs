use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parley_llm::{ChatClient, ChatRequest, ChatResponse, ChatStream, StreamEvent};

pub enum Reply {
    Text(String),
    Chunks(Vec<&'static str>),
    FailAfter(Vec<&'static str>),
    Unavailable,
}

/// Deterministic backend that plays back queued replies and records requests
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: ChatRequest) -> Result<Reply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let text = match self.next(request)? {
            Reply::Text(text) => text,
            Reply::Chunks(chunks) => chunks.concat(),
            Reply::FailAfter(_) | Reply::Unavailable => return Err(anyhow!("backend unavailable")),
        };
        Ok(ChatResponse {
            content: Some(text),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream> {
        let mut events: Vec<Result<StreamEvent>> = Vec::new();
        match self.next(request)? {
            Reply::Text(text) => events.push(Ok(StreamEvent::Message { content: text })),
            Reply::Chunks(chunks) => {
                for chunk in chunks {
                    events.push(Ok(StreamEvent::Message { content: chunk.to_string() }));
                }
                events.push(Ok(StreamEvent::Done { finish_reason: Some("stop".to_string()) }));
            }
            Reply::FailAfter(chunks) => {
                for chunk in chunks {
                    events.push(Ok(StreamEvent::Message { content: chunk.to_string() }));
                }
                events.push(Err(anyhow!("connection reset")));
            }
            Reply::Unavailable => return Err(anyhow!("backend unavailable")),
        }
        Ok(Box::pin(futures::stream::iter(events)))
    }
}
