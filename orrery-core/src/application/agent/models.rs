use crate::application::tooling::Strictness;
use crate::config::AgentSettings;
use crate::constants::{DEFAULT_MAX_TURNS, DEFAULT_SYSTEM_PROMPT};
use serde::Serialize;
use serde_json::Value;

/// One dispatched tool call as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    pub call_id: String,
    pub tool: String,
    pub input: Value,
    pub success: bool,
    /// Tool output, or the error text that was handed to the model.
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvokeOutcome {
    FinalAnswer {
        response: String,
        steps: Vec<AgentStep>,
        model_calls: usize,
    },
    TurnLimitExceeded {
        /// Most recent assistant text produced during the invoke, if any.
        partial: Option<String>,
        steps: Vec<AgentStep>,
        model_calls: usize,
    },
}

impl InvokeOutcome {
    pub fn steps(&self) -> &[AgentStep] {
        match self {
            InvokeOutcome::FinalAnswer { steps, .. }
            | InvokeOutcome::TurnLimitExceeded { steps, .. } => steps,
        }
    }

    pub fn model_calls(&self) -> usize {
        match self {
            InvokeOutcome::FinalAnswer { model_calls, .. }
            | InvokeOutcome::TurnLimitExceeded { model_calls, .. } => *model_calls,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, InvokeOutcome::FinalAnswer { .. })
    }
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub system_prompt: String,
    /// Upper bound on model calls per invoke. Zero is treated as one.
    pub max_turns: usize,
    /// Overrides the registry's validation strictness when set.
    pub strictness: Option<Strictness>,
}

impl AgentOptions {
    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self {
            system_prompt: settings.system_prompt.clone(),
            max_turns: settings.max_turns,
            strictness: Some(settings.strictness),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            strictness: None,
        }
    }
}
