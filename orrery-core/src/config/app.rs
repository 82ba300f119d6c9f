use super::agent::{AgentSettings, ToolSettings};
use super::error::ConfigError;
use super::model::ModelConfig;
use super::provider::ProviderConfig;
use std::path::Path;

/// Application configuration loaded from orrery.toml
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub agent: AgentSettings,
    pub tools: ToolSettings,
    pub providers: Vec<ProviderConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None).
    ///
    /// An explicit path must exist; a missing default file yields the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Parse configuration from TOML text; `origin` is only used in errors.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        super::loader::parse_config(content, origin)
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|provider| provider.name == name)
    }
}
