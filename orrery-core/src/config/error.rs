use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("provider entry is missing a name")]
    MissingProviderName,

    #[error("provider '{provider}' has an empty command")]
    EmptyCommand { provider: String },

    #[error("provider '{provider}' is declared more than once")]
    DuplicateProvider { provider: String },

    #[error("unknown built-in tool '{name}'")]
    UnknownBuiltin { name: String },

    #[error("agent.max_turns must be at least 1")]
    InvalidMaxTurns,
}
