use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use parley_llm::{ChatStream, StreamEvent};
use parley_persist::ThreadHandle;

use crate::error::{AgentError, Result};
use crate::session::TurnOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Streaming,
    Drained,
    Failed,
}

/// Lazy, finite sequence of text deltas for one turn.
///
/// Non-empty deltas are yielded in backend order. A backend failure is
/// yielded once as an error and ends the sequence. [`TurnStream::finish`]
/// hands back the aggregated reply and handle only after a clean drain.
pub struct TurnStream {
    events: ChatStream,
    handle: ThreadHandle,
    text: String,
    phase: Phase,
}

impl TurnStream {
    pub(crate) fn new(events: ChatStream, handle: ThreadHandle) -> Self {
        Self {
            events,
            handle,
            text: String::new(),
            phase: Phase::Streaming,
        }
    }

    /// Text received so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_drained(&self) -> bool {
        self.phase == Phase::Drained
    }

    pub fn finish(self) -> Result<TurnOutcome> {
        match self.phase {
            Phase::Drained if self.text.trim().is_empty() => Err(AgentError::EmptyResponse),
            Phase::Drained => Ok(TurnOutcome {
                text: self.text,
                handle: self.handle,
            }),
            Phase::Streaming | Phase::Failed => Err(AgentError::StreamNotDrained),
        }
    }
}

impl Stream for TurnStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.phase != Phase::Streaming {
            return Poll::Ready(None);
        }

        loop {
            match this.events.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(StreamEvent::Message { content }))) => {
                    if content.is_empty() {
                        continue;
                    }
                    this.text.push_str(&content);
                    return Poll::Ready(Some(Ok(content)));
                }
                Poll::Ready(Some(Ok(StreamEvent::Done { .. }))) | Poll::Ready(None) => {
                    this.phase = Phase::Drained;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(e))) => {
                    tracing::warn!(error = %e, received = this.text.len(), "Turn stream failed");
                    this.phase = Phase::Failed;
                    return Poll::Ready(Some(Err(AgentError::Backend(e))));
                }
            }
        }
    }
}
