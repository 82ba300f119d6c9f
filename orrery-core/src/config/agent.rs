use crate::application::tooling::Strictness;
use crate::constants::{DEFAULT_MAX_TURNS, DEFAULT_SYSTEM_PROMPT};
use serde::Deserialize;
use std::path::PathBuf;

/// Turn loop settings from the `[agent]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub system_prompt: String,
    pub max_turns: usize,
    pub strictness: Strictness,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            strictness: Strictness::Open,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawAgent {
    pub(crate) system_prompt: Option<String>,
    pub(crate) max_turns: Option<usize>,
    #[serde(default)]
    pub(crate) strictness: Strictness,
}

/// Built-in tool selection from the `[tools]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub builtin: Vec<String>,
    /// Sandbox root handed to the filesystem provider preset.
    pub filesystem_root: Option<PathBuf>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            builtin: crate::builtin::BUILTIN_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            filesystem_root: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawTools {
    pub(crate) builtin: Option<Vec<String>>,
    pub(crate) filesystem_root: Option<String>,
}
