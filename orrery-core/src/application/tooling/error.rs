use std::time::Duration;
use thiserror::Error;

use super::process::ConnectionState;

/// Rejected tool arguments. Produced before the tool runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("arguments for tool '{tool}' must be a JSON object, got {found}")]
    NotAnObject { tool: String, found: &'static str },
    #[error("tool '{tool}' is missing required field '{field}'")]
    MissingField { tool: String, field: String },
    #[error("field '{field}' of tool '{tool}' expects {expected}, got {found}")]
    TypeMismatch {
        tool: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("field '{field}' is not declared by tool '{tool}'")]
    UnknownField { tool: String, field: String },
}

/// Failure of a single tool dispatch. Always recoverable: the turn loop
/// reports it to the model as a tool-role message.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("tool provider '{provider}' is unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },
    #[error("tool provider '{provider}' exited unexpectedly")]
    ProviderCrashed { provider: String },
    #[error("tool '{tool}' on provider '{provider}' timed out after {timeout:?}")]
    ToolTimeout {
        provider: String,
        tool: String,
        timeout: Duration,
    },
    #[error("tool provider '{provider}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        provider: String,
        code: i64,
        message: String,
    },
    #[error("tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
    #[error("tool call cancelled")]
    Cancelled,
}

impl ToolError {
    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Execution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Short stable label used in logs and step records.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::Validation(_) => "validation",
            ToolError::ProviderUnavailable { .. } => "provider_unavailable",
            ToolError::ProviderCrashed { .. } => "provider_crashed",
            ToolError::ToolTimeout { .. } => "tool_timeout",
            ToolError::Rpc { .. } => "rpc",
            ToolError::Execution { .. } => "execution",
            ToolError::Cancelled => "cancelled",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ToolError::UnknownTool(name) => format!("Tool \"{name}\" is not available."),
            ToolError::Validation(err) => format!("Invalid tool arguments: {err}."),
            ToolError::ProviderUnavailable { provider, .. } => {
                format!("Tool provider \"{provider}\" is not running.")
            }
            ToolError::ProviderCrashed { provider } => {
                format!("Tool provider \"{provider}\" stopped unexpectedly.")
            }
            ToolError::ToolTimeout { tool, .. } => format!("Tool \"{tool}\" took too long."),
            ToolError::Rpc { provider, message, .. } => {
                format!("Tool provider \"{provider}\" rejected the call: {message}")
            }
            ToolError::Execution { tool, message } => {
                format!("Tool \"{tool}\" failed: {message}")
            }
            ToolError::Cancelled => "Tool call was cancelled.".to_string(),
        }
    }
}

/// Startup-time registration fault.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool '{tool}' from '{incoming}' collides with the tool registered by '{owner}'")]
    NameCollision {
        tool: String,
        incoming: String,
        owner: String,
    },
    #[error("provider '{provider}' is not ready (state: {state})")]
    ProviderNotReady {
        provider: String,
        state: ConnectionState,
    },
}
