//! Model factory - creates the client from config

use super::clients::OpenAiCompatibleClient;
use super::types::ModelError;
use crate::config::ModelConfig;
use std::env;
use tracing::{info, warn};

/// Resolve an API key from the named environment variable. Blank values
/// count as unset.
pub fn resolve_api_key(provider: &str, env_var: &str) -> Option<String> {
    let name = env_var.trim();
    if name.is_empty() {
        return None;
    }
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Ok(_) => {
            warn!(provider, env_var = name, "API key environment variable is empty");
            None
        }
        Err(err) => {
            warn!(
                provider,
                env_var = name,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating the model client from configuration.
pub struct ModelFactory;

impl ModelFactory {
    /// Every preset speaks the OpenAI-compatible chat completions dialect;
    /// the preset only picks endpoint, default model and key variable.
    pub fn create(config: &ModelConfig) -> Result<OpenAiCompatibleClient, ModelError> {
        let client = OpenAiCompatibleClient::from_config(config)?;
        info!(
            provider = client.id(),
            model = client.model(),
            endpoint = config.endpoint.as_str(),
            "Model client ready"
        );
        Ok(client)
    }
}
