//! Message adapters - convert between session messages and API formats

use crate::session::{Message, MessageRole};
use crate::types::ToolSpec;
use serde_json::{Value, json};

/// Adapter for converting messages to different API formats
pub struct MessageAdapter;

impl MessageAdapter {
    /// Convert a system prompt plus history to OpenAI-style chat messages.
    ///
    /// Assistant turns that requested tools carry `tool_calls`; tool results
    /// carry the `tool_call_id` they answer.
    pub fn to_openai_format(system_prompt: &str, messages: &[Message]) -> Vec<Value> {
        let mut converted = Vec::with_capacity(messages.len() + 1);
        if !system_prompt.trim().is_empty() {
            converted.push(json!({ "role": "system", "content": system_prompt }));
        }

        for message in messages {
            let value = match message.role {
                MessageRole::Assistant if message.has_tool_calls() => {
                    let calls: Vec<Value> = message
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.call_id,
                                "type": "function",
                                "function": {
                                    "name": call.tool_name,
                                    "arguments": call.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    let content = if message.content.is_empty() {
                        Value::Null
                    } else {
                        Value::String(message.content.clone())
                    };
                    json!({ "role": "assistant", "content": content, "tool_calls": calls })
                }
                MessageRole::Tool => json!({
                    "role": "tool",
                    "tool_call_id": message.tool_call_id.clone().unwrap_or_default(),
                    "content": message.content,
                }),
                role => json!({ "role": role.as_str(), "content": message.content }),
            };
            converted.push(value);
        }
        converted
    }

    /// Convert tool specs to the `tools` array of a function-calling request.
    pub fn tools_to_openai_format(tools: &[ToolSpec]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    }
                })
            })
            .collect()
    }
}
