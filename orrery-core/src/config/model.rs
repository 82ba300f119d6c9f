use crate::constants::DEFAULT_MODEL_TIMEOUT_SECS;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Known OpenAI-compatible backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPreset {
    #[default]
    OpenRouter,
    Moonshot,
}

impl ModelPreset {
    pub fn id(self) -> &'static str {
        match self {
            ModelPreset::OpenRouter => "openrouter",
            ModelPreset::Moonshot => "moonshot",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            ModelPreset::OpenRouter => "https://openrouter.ai/api/v1",
            ModelPreset::Moonshot => "https://api.moonshot.cn/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ModelPreset::OpenRouter => "anthropic/claude-haiku-4.5",
            ModelPreset::Moonshot => "moonshot-v1-8k",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            ModelPreset::OpenRouter => "OPENROUTER_API_KEY",
            ModelPreset::Moonshot => "MOONSHOT_API_KEY",
        }
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Resolved model backend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub preset: ModelPreset,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub request_timeout: Duration,
}

impl ModelConfig {
    pub fn from_preset(preset: ModelPreset) -> Self {
        Self {
            preset,
            endpoint: preset.endpoint().to_string(),
            model: preset.default_model().to_string(),
            api_key_env: preset.api_key_env().to_string(),
            temperature: None,
            request_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from_preset(ModelPreset::default())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawModel {
    preset: Option<ModelPreset>,
    endpoint: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

impl From<RawModel> for ModelConfig {
    fn from(raw: RawModel) -> Self {
        let mut config = ModelConfig::from_preset(raw.preset.unwrap_or_default());
        if let Some(endpoint) = raw.endpoint.filter(|value| !value.trim().is_empty()) {
            config.endpoint = endpoint;
        }
        if let Some(model) = raw.model.filter(|value| !value.trim().is_empty()) {
            config.model = model;
        }
        if let Some(env_var) = raw.api_key_env.filter(|value| !value.trim().is_empty()) {
            config.api_key_env = env_var;
        }
        config.temperature = raw.temperature;
        if let Some(secs) = raw.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }
}
