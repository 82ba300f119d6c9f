//! OpenAI-compatible client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelConfig;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::ModelError;
use crate::session::ToolCallRequest;
use crate::types::{ModelRequest, ModelTurn};

/// Client for `/chat/completions` endpoints with native function calling
/// (OpenRouter, Moonshot, OpenAI and compatible gateways).
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    base: HttpClientBase,
    model: String,
    temperature: Option<f32>,
    api_path: String,
}

impl OpenAiCompatibleClient {
    /// Fails with [`ModelError::MissingApiKey`] when the configured key
    /// variable is unset or blank.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let provider = config.preset.id();
        let api_key = resolve_api_key(provider, &config.api_key_env)
            .ok_or_else(|| ModelError::missing_api_key(provider, &config.api_key_env))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self, ModelError> {
        let base = HttpClientBase::new(
            config.preset.id().to_string(),
            config.endpoint.clone(),
            api_key,
            config.request_timeout,
        )?;
        Ok(Self {
            base,
            model: config.model.clone(),
            temperature: config.temperature,
            api_path: "chat/completions".to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleClient {
    async fn generate_reply(&self, request: ModelRequest) -> Result<ModelTurn, ModelError> {
        let url = self.base.build_url(&self.api_path);

        let tools = MessageAdapter::tools_to_openai_format(&request.tools);
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: MessageAdapter::to_openai_format(&request.system_prompt, &request.messages),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            tools,
            temperature: self.temperature,
            stream: false,
        };

        info!(
            provider = self.base.id.as_str(),
            model = self.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: ChatCompletionResponse = self.base.post_with_bearer(&url, &payload).await?;
        debug!("Received response from OpenAI-compatible provider");

        interpret_response(&self.base.id, response)
    }
}

fn interpret_response(
    provider: &str,
    response: ChatCompletionResponse,
) -> Result<ModelTurn, ModelError> {
    if let Some(error) = response.error {
        let reason = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ModelError::backend(provider, reason));
    }

    let message = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .ok_or_else(|| ModelError::invalid_response(provider, "response has no choices"))?;

    let content = message.content.unwrap_or_default();
    let wire_calls = message.tool_calls.unwrap_or_default();
    if wire_calls.is_empty() {
        if content.trim().is_empty() {
            return Err(ModelError::invalid_response(
                provider,
                "message has neither content nor tool calls",
            ));
        }
        return Ok(ModelTurn::Answer { text: content });
    }

    let mut calls = Vec::with_capacity(wire_calls.len());
    for call in wire_calls {
        let arguments = if call.function.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|err| {
                ModelError::invalid_response(
                    provider,
                    format!(
                        "arguments for tool call '{}' are not valid JSON: {err}",
                        call.id
                    ),
                )
            })?
        };
        calls.push(ToolCallRequest::new(call.id, call.function.name, arguments));
    }

    Ok(ModelTurn::ToolCalls {
        preamble: content,
        calls,
    })
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}
