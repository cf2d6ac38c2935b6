use parley_persist::DEFAULT_CONTEXT_WINDOW;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "ai/gpt-oss:latest";

const CHAT_INSTRUCTIONS: &str = "You are a friendly local assistant running fully offline.";
const TITLE_INSTRUCTIONS: &str = "Write a short title, at most six words, for a conversation \
that opens with the user's message. Reply with the title only, without quotes.";

/// Named model profile an agent session runs with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProfile {
    pub name: String,
    pub model: String,
    pub instructions: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// How many stored messages the agent sees per turn
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, model: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instructions: instructions.into(),
            temperature: None,
            max_tokens: None,
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    /// Main conversational profile
    pub fn chat() -> Self {
        Self::new("chat", DEFAULT_MODEL, CHAT_INSTRUCTIONS)
    }

    /// Short one-shot profile used to name conversations
    pub fn title_generator() -> Self {
        Self::new("title-generator", DEFAULT_MODEL, TITLE_INSTRUCTIONS)
            .with_temperature(0.2)
            .with_max_tokens(32)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }
}
