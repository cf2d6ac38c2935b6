use std::collections::VecDeque;
use anyhow::Result;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::traits::ChatStream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental response text
    Message {
        content: String,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Message {
                        content: content.clone(),
                    });
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}

/// Parse an OpenAI-compatible `text/event-stream` body into stream events.
///
/// The stream ends at the `[DONE]` marker or when the body closes.
pub fn parse_chat_sse_stream<S, B, E>(byte_stream: S) -> ChatStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = VecDeque::with_capacity(8192);
        let mut finished = false;

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref().iter().copied());

                    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

                        let Ok(line_str) = std::str::from_utf8(&line_bytes) else {
                            continue;
                        };
                        let line = line_str.trim();

                        let Some(data) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let data = data.trim_start();

                        if data == "[DONE]" {
                            finished = true;
                            break;
                        }

                        match serde_json::from_str::<ChatStreamChunk>(data) {
                            Ok(chunk) => {
                                for event in chunk.to_stream_events() {
                                    yield Ok(event);
                                }
                            }
                            Err(e) => yield Err(anyhow::anyhow!("Failed to parse chat chunk: {}", e)),
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
            }

            if finished {
                break;
            }
        }

        if finished {
            yield Ok(StreamEvent::Done { finish_reason: None });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn body(chunks: Vec<&'static str>) -> impl Stream<Item = std::result::Result<&'static [u8], std::io::Error>> {
        stream::iter(chunks.into_iter().map(|c| Ok(c.as_bytes())))
    }

    #[tokio::test]
    async fn test_parses_deltas_split_across_chunks() {
        let events: Vec<StreamEvent> = parse_chat_sse_stream(body(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\ndata: {\"choi",
            "ces\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n\n",
            "data: [DONE]\n\n",
        ]))
        .map(|e| e.unwrap())
        .collect()
        .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Message { content: "Hel".to_string() },
                StreamEvent::Message { content: "lo".to_string() },
                StreamEvent::Done { finish_reason: None },
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_chunk_yields_error_and_continues() {
        let events: Vec<Result<StreamEvent>> = parse_chat_sse_stream(body(vec![
            "data: not-json\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"},\"finish_reason\":\"stop\"}]}\n",
        ]))
        .collect()
        .await;

        assert_eq!(events.len(), 3);
        assert!(events[0].is_err());
        assert_eq!(events[1].as_ref().unwrap(), &StreamEvent::Message { content: "ok".to_string() });
        assert_eq!(
            events[2].as_ref().unwrap(),
            &StreamEvent::Done { finish_reason: Some("stop".to_string()) }
        );
    }
}
