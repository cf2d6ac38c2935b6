use std::sync::Arc;

use parley_agent::AgentSession;
use parley_persist::{PersistenceClient, DEFAULT_TITLE};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::error::Result;

pub const MAX_TITLE_CHARS: usize = 100;

/// Best-effort background titling of new conversations.
///
/// Tasks are detached from the request that starts them. Their lifetime is
/// bounded by [`TitleGenerator::shutdown`], and every failure ends in a log
/// line.
#[derive(Clone)]
pub struct TitleGenerator {
    agent: AgentSession,
    repository: Arc<dyn PersistenceClient>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl TitleGenerator {
    pub fn new(agent: AgentSession, repository: Arc<dyn PersistenceClient>) -> Self {
        Self {
            agent,
            repository,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn a titling task for the conversation's first user input
    pub fn maybe_generate(&self, conversation_id: Uuid, first_input: &str) {
        if self.cancel.is_cancelled() {
            return;
        }

        let agent = self.agent.clone();
        let repository = Arc::clone(&self.repository);
        let cancel = self.cancel.clone();
        let input = first_input.to_string();

        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(conversation_id = %conversation_id, "Title generation cancelled");
                }
                result = generate(&agent, repository.as_ref(), conversation_id, &input) => match result {
                    Ok(Some(title)) => {
                        tracing::info!(conversation_id = %conversation_id, title = %title, "Conversation titled");
                    }
                    Ok(None) => {
                        tracing::debug!(conversation_id = %conversation_id, "Title generation skipped");
                    }
                    Err(e) => {
                        tracing::warn!(conversation_id = %conversation_id, error = %e, "Title generation failed");
                    }
                },
            }
        });
    }

    /// Number of titling tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for running tasks without stopping new ones from being accepted
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel running tasks, refuse new ones and wait for them to exit
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("Title generator stopped");
    }
}

async fn generate(
    agent: &AgentSession,
    repository: &dyn PersistenceClient,
    conversation_id: Uuid,
    input: &str,
) -> Result<Option<String>> {
    // The turn that spawned us writes the thread token concurrently, so only
    // the title is re-checked here.
    let Some(conversation) = repository.get(conversation_id).await? else {
        return Ok(None);
    };
    if conversation.title != DEFAULT_TITLE {
        return Ok(None);
    }

    let raw = agent.complete(input).await?;
    let Some(title) = normalize_title(&raw) else {
        return Ok(None);
    };

    repository.update_title(conversation_id, &title).await?;
    Ok(Some(title))
}

/// Trimmed title cut to [`MAX_TITLE_CHARS`] characters; blank output gives none
pub fn normalize_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_TITLE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_truncates() {
        assert_eq!(normalize_title("  Weekend plans \n").as_deref(), Some("Weekend plans"));
        assert_eq!(normalize_title(" \t "), None);

        let long = "é".repeat(150);
        let title = normalize_title(&long).unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }
}
