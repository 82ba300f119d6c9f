use super::agent::{AgentSettings, RawAgent, RawTools, ToolSettings};
use super::error::ConfigError;
use super::model::{ModelConfig, RawModel};
use super::provider::{ProviderConfig, RawProvider, preset_providers};
use super::AppConfig;
use crate::builtin::BUILTIN_NAMES;
use crate::constants::{CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    model: RawModel,
    #[serde(default)]
    agent: RawAgent,
    #[serde(default)]
    tools: RawTools,
    /// `None` selects the provider presets; an explicit empty list disables them.
    providers: Option<Vec<RawProvider>>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        if from_filename(ENV_PATH).is_ok() {
            debug!(path = ENV_PATH, "Loaded environment overlay");
        }
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    match path {
        Some(path) => read_config(path),
        None => {
            let default_path = Path::new(CONFIG_PATH);
            match read_config(default_path) {
                Err(ConfigError::NotFound { .. }) => {
                    info!(
                        path = CONFIG_PATH,
                        "No configuration file found; using built-in defaults"
                    );
                    validate_and_build(RawConfig::default())
                }
                other => other,
            }
        }
    }
}

pub(super) fn parse_config(content: &str, origin: &Path) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    validate_and_build(parsed)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let model = ModelConfig::from(parsed.model);
    let agent = build_agent(parsed.agent)?;
    let tools = build_tools(parsed.tools)?;

    let providers = match parsed.providers {
        None => {
            let root = tools
                .filesystem_root
                .clone()
                .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
            preset_providers(&root)
        }
        Some(raw_providers) => {
            let mut seen = HashSet::new();
            let mut providers = Vec::with_capacity(raw_providers.len());
            for raw in raw_providers {
                if raw.name.trim().is_empty() {
                    return Err(ConfigError::MissingProviderName);
                }
                if raw.command.trim().is_empty() {
                    return Err(ConfigError::EmptyCommand { provider: raw.name });
                }
                if !seen.insert(raw.name.clone()) {
                    return Err(ConfigError::DuplicateProvider { provider: raw.name });
                }
                providers.push(ProviderConfig::from(raw));
            }
            providers
        }
    };

    Ok(AppConfig {
        model,
        agent,
        tools,
        providers,
    })
}

fn build_agent(raw: RawAgent) -> Result<AgentSettings, ConfigError> {
    let mut agent = AgentSettings::default();
    if let Some(prompt) = raw.system_prompt.filter(|value| !value.trim().is_empty()) {
        agent.system_prompt = prompt;
    }
    if let Some(max_turns) = raw.max_turns {
        if max_turns == 0 {
            return Err(ConfigError::InvalidMaxTurns);
        }
        agent.max_turns = max_turns;
    }
    agent.strictness = raw.strictness;
    Ok(agent)
}

fn build_tools(raw: RawTools) -> Result<ToolSettings, ConfigError> {
    let mut tools = ToolSettings::default();
    if let Some(builtin) = raw.builtin {
        if let Some(unknown) = builtin
            .iter()
            .find(|name| !BUILTIN_NAMES.contains(&name.as_str()))
        {
            return Err(ConfigError::UnknownBuiltin {
                name: unknown.clone(),
            });
        }
        tools.builtin = builtin;
    }
    tools.filesystem_root = raw.filesystem_root.map(|root| {
        PathBuf::from(
            shellexpand::full(&root)
                .map(|cow| cow.into_owned())
                .unwrap_or(root),
        )
    });
    Ok(tools)
}
