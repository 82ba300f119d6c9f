use orrery_session::{Message, ToolCallRequest};
use serde::Serialize;
use serde_json::Value;

/// Tool metadata presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Everything the model capability sees for one turn.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
}

/// Result of one model call: either a final answer or a batch of tool calls.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    Answer {
        text: String,
    },
    ToolCalls {
        /// Assistant text emitted alongside the calls; usually empty.
        preamble: String,
        calls: Vec<ToolCallRequest>,
    },
}

impl ModelTurn {
    pub fn answer(text: impl Into<String>) -> Self {
        ModelTurn::Answer { text: text.into() }
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        ModelTurn::ToolCalls {
            preamble: String::new(),
            calls,
        }
    }
}
