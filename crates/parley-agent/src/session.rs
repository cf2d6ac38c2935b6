use std::sync::Arc;

use parley_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use parley_persist::{ChatRole, PersistenceClient, ThreadHandle};

use crate::error::{AgentError, Result};
use crate::profile::AgentProfile;
use crate::stream::TurnStream;

/// Result of one completed exchange
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub text: String,
    pub handle: ThreadHandle,
}

/// One logical agent bound to a backend client and a profile.
///
/// With a history store attached, every turn sees the profile's window of
/// recent messages stored under the handle's key. Without one the agent is
/// stateless and only sees the input.
#[derive(Clone)]
pub struct AgentSession {
    client: Arc<dyn ChatClient>,
    profile: AgentProfile,
    history: Option<Arc<dyn PersistenceClient>>,
}

impl AgentSession {
    pub fn new(client: Arc<dyn ChatClient>, profile: AgentProfile) -> Self {
        Self {
            client,
            profile,
            history: None,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn PersistenceClient>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Blocking turn: full reply text plus the handle to persist
    pub async fn run_turn(&self, handle: &ThreadHandle, input: &str) -> Result<TurnOutcome> {
        let request = self.build_request(handle, input).await?;
        tracing::debug!(
            agent = %self.profile.name,
            model = %request.model,
            context = request.messages.len(),
            "Running turn"
        );

        let response = self.client.chat(request).await?;
        if let Some(usage) = response.usage {
            tracing::debug!(
                agent = %self.profile.name,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Turn completed"
            );
        }
        let text = response.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AgentError::EmptyResponse);
        }

        Ok(TurnOutcome {
            text,
            handle: handle.clone(),
        })
    }

    /// Streaming turn; the outcome is only readable once the stream is drained
    pub async fn stream_turn(&self, handle: &ThreadHandle, input: &str) -> Result<TurnStream> {
        let request = self.build_request(handle, input).await?;
        tracing::debug!(
            agent = %self.profile.name,
            model = %request.model,
            context = request.messages.len(),
            "Streaming turn"
        );

        let events = self.client.chat_stream(request).await?;
        Ok(TurnStream::new(events, handle.clone()))
    }

    /// One-shot exchange with no thread behind it
    pub async fn complete(&self, input: &str) -> Result<String> {
        let outcome = self.run_turn(&ThreadHandle::fresh(), input).await?;
        Ok(outcome.text)
    }

    async fn build_request(&self, handle: &ThreadHandle, input: &str) -> Result<ChatRequest> {
        let mut messages = vec![Message::system(self.profile.instructions.clone())];

        let recent = match (&self.history, handle.storage_key()) {
            (Some(history), Some(key)) => {
                history.fetch_recent(key, self.profile.context_window).await?
            }
            _ => Vec::new(),
        };

        // The caller normally stores the user turn before running it
        let input_stored = recent
            .last()
            .is_some_and(|last| last.role == ChatRole::User && last.text() == input);

        messages.extend(recent.iter().map(Message::from));
        if !input_stored {
            messages.push(Message::user(input));
        }

        let options = ChatOptions {
            temperature: self.profile.temperature,
            max_tokens: self.profile.max_tokens,
        };

        Ok(ChatRequest::new(self.profile.model.clone(), messages).with_options(options))
    }
}
