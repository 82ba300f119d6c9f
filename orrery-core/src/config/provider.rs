use crate::constants::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_SHUTDOWN_GRACE_SECS,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Launch and supervision settings for one MCP stdio tool provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
    /// Abort startup when the provider cannot be brought up.
    pub required: bool,
    pub handshake_timeout: Duration,
    pub call_timeout: Duration,
    pub shutdown_grace: Duration,
    /// Whether several calls may be in flight on the connection at once.
    pub interleaved: bool,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
            required: false,
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            interleaved: true,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_interleaved(mut self, interleaved: bool) -> Self {
        self.interleaved = interleaved;
        self
    }

    pub fn command_line(&self) -> String {
        let mut line = self.command.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawProvider {
    pub(crate) name: String,
    pub(crate) command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
    #[serde(default)]
    required: bool,
    handshake_timeout_secs: Option<u64>,
    call_timeout_secs: Option<u64>,
    shutdown_grace_secs: Option<u64>,
    interleaved: Option<bool>,
}

impl From<RawProvider> for ProviderConfig {
    fn from(raw: RawProvider) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        let mut config = ProviderConfig::new(raw.name, PathBuf::from(expand(&raw.command)))
            .with_args(raw.args.iter().map(|arg| expand(arg)))
            .with_required(raw.required);
        config.env = raw
            .env
            .into_iter()
            .map(|(key, value)| {
                let expanded = expand(&value);
                (key, expanded)
            })
            .collect();
        config.workdir = raw.workdir.map(|dir| PathBuf::from(expand(&dir)));
        if let Some(secs) = raw.handshake_timeout_secs {
            config.handshake_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = raw.call_timeout_secs {
            config.call_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = raw.shutdown_grace_secs {
            config.shutdown_grace = Duration::from_secs(secs);
        }
        if let Some(interleaved) = raw.interleaved {
            config.interleaved = interleaved;
        }
        config
    }
}

pub const TAVILY_PRESET: &str = "tavily";
pub const SEQUENTIAL_THINKING_PRESET: &str = "sequential-thinking";
pub const FILESYSTEM_PRESET: &str = "filesystem";

/// Providers used when the configuration file declares none.
pub fn preset_providers(filesystem_root: &Path) -> Vec<ProviderConfig> {
    let mut tavily = ProviderConfig::new(TAVILY_PRESET, "npx").with_args(["-y", "tavily-mcp@0.1.3"]);
    match env::var("TAVILY_API_KEY") {
        Ok(key) if !key.trim().is_empty() => tavily = tavily.with_env("TAVILY_API_KEY", key),
        _ => warn!(
            provider = TAVILY_PRESET,
            env_var = "TAVILY_API_KEY",
            "API key environment variable is not set; web search calls will fail"
        ),
    }

    let thinking = ProviderConfig::new(SEQUENTIAL_THINKING_PRESET, "npx")
        .with_args(["-y", "@modelcontextprotocol/server-sequential-thinking"])
        .with_env("DISABLE_THOUGHT_LOGGING", "true");

    let filesystem = ProviderConfig::new(FILESYSTEM_PRESET, "npx").with_args([
        "-y".to_string(),
        "@modelcontextprotocol/server-filesystem".to_string(),
        filesystem_root.display().to_string(),
    ]);

    vec![tavily, thinking, filesystem]
}
