use config::{Config as ConfigLoader, ConfigError, Environment, File};
use parley_agent::AgentProfile;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `memory` or `mongodb`
    pub backend: String,
    pub database: String,
    // Secret, from MONGODB_URI only
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    // Secret, from OPENAI_API_KEY only; local runners accept any key
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

fn default_api_key() -> String {
    "none".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub chat: AgentSettings,
    #[serde(default)]
    pub title_generator: AgentSettings,
}

/// Per-agent overrides; anything left out keeps the built-in profile value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentSettings {
    pub model: Option<String>,
    pub instructions: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub context_window: Option<usize>,
}

impl AgentSettings {
    pub fn apply(&self, mut profile: AgentProfile) -> AgentProfile {
        if let Some(model) = &self.model {
            profile = profile.with_model(model.clone());
        }
        if let Some(instructions) = self.instructions.as_ref().filter(|i| !i.trim().is_empty()) {
            profile = profile.with_instructions(instructions.clone());
        }
        if let Some(temp) = self.temperature {
            profile = profile.with_temperature(temp);
        }
        if let Some(max_tokens) = self.max_tokens {
            profile = profile.with_max_tokens(max_tokens);
        }
        if let Some(window) = self.context_window {
            profile = profile.with_context_window(window);
        }
        profile
    }
}

impl AgentsConfig {
    pub fn chat_profile(&self) -> AgentProfile {
        self.chat.apply(AgentProfile::chat())
    }

    pub fn title_profile(&self) -> AgentProfile {
        self.title_generator.apply(AgentProfile::title_generator())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `PARLEY_`-prefixed environment variables, `__` between keys
    ///    (`PARLEY_SERVER__PORT=9000`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Config = config.try_deserialize()?;
        cfg.apply_secrets()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        config.try_deserialize()
    }

    fn apply_secrets(&mut self) -> Result<(), ConfigError> {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = api_key;
        }
        if let Ok(base_url) = std::env::var("OPENAI_API_BASE") {
            self.llm.base_url = base_url;
        }
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            self.storage.uri = uri;
        }

        if self.storage.backend.eq_ignore_ascii_case("mongodb") && self.storage.uri.is_empty() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 3000

        [cors]
        enabled = true
        origins = ["http://localhost:3000"]

        [storage]
        backend = "memory"
        database = "test"

        [llm]
        base_url = "http://localhost:12434/engines/llama.cpp/v1"

        [agents.chat]
        model = "local-model"
        context_window = 6

        [logging]
        level = "debug"
        format = "json"
    "#;

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_secs, 300);
        assert_eq!(config.storage.database, "test");
        assert_eq!(config.llm.api_key, "none");
    }

    #[test]
    fn test_agent_overrides_keep_defaults() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        let chat = config.agents.chat_profile();
        assert_eq!(chat.model, "local-model");
        assert_eq!(chat.context_window, 6);
        assert_eq!(chat.instructions, AgentProfile::chat().instructions);

        assert_eq!(config.agents.title_profile(), AgentProfile::title_generator());
    }

    #[test]
    fn test_mongodb_backend_requires_uri() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.storage.backend = "mongodb".to_string();
        config.storage.uri.clear();

        if std::env::var("MONGODB_URI").is_err() {
            assert!(config.apply_secrets().is_err());
        }
    }
}
