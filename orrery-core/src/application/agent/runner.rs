use super::dispatch::dispatch_batch;
use super::errors::AgentError;
use super::instructions::compose_system_prompt;
use super::models::{AgentOptions, AgentStep, InvokeOutcome};
use crate::application::tooling::ToolRegistry;
use crate::infrastructure::model::ModelProvider;
use crate::session::{Message, MessageRole, Session, SessionTurn};
use crate::types::{ModelRequest, ModelTurn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Agent<P: ModelProvider> {
    provider: P,
    registry: Arc<ToolRegistry>,
    options: AgentOptions,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(provider: P, registry: Arc<ToolRegistry>, options: AgentOptions) -> Self {
        Self {
            provider,
            registry,
            options,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub async fn invoke(
        &self,
        session: &mut Session,
        input: impl Into<String>,
    ) -> Result<InvokeOutcome, AgentError> {
        self.invoke_with_cancel(session, input, CancellationToken::new())
            .await
    }

    /// Drive one user message to a final answer or the turn cap.
    ///
    /// Cancelling `cancel` aborts the pending model call or tool batch; the
    /// staged turn is dropped and the session keeps its previous history.
    pub async fn invoke_with_cancel(
        &self,
        session: &mut Session,
        input: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<InvokeOutcome, AgentError> {
        let max_turns = self.options.max_turns.max(1);
        let strictness = self
            .options
            .strictness
            .unwrap_or_else(|| self.registry.strictness());
        let system_prompt =
            compose_system_prompt(&self.options.system_prompt, &self.registry.instructions());
        let tools = self.registry.specs();

        let mut turn = session.begin_turn();
        info!(
            session_id = turn.session_id(),
            max_turns,
            tools = tools.len(),
            "Agent invoke started"
        );
        turn.push(Message::user(input));

        let mut steps: Vec<AgentStep> = Vec::new();
        let mut model_calls = 0usize;

        loop {
            let request = ModelRequest {
                system_prompt: system_prompt.clone(),
                messages: turn.transcript(),
                tools: tools.clone(),
            };
            model_calls += 1;
            debug!(
                model_calls,
                messages = request.messages.len(),
                "Submitting turn to model provider"
            );

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(model_calls, "Invoke cancelled while awaiting the model");
                    return Err(AgentError::Cancelled);
                }
                reply = self.provider.generate_reply(request) => reply?,
            };

            match reply {
                ModelTurn::Answer { text } => {
                    if text.trim().is_empty() {
                        return Err(AgentError::InvalidResponse(
                            "model returned an empty answer".into(),
                        ));
                    }
                    turn.push(Message::assistant(text.clone()));
                    let committed = turn.commit();
                    info!(
                        model_calls,
                        steps = steps.len(),
                        committed,
                        "Agent returned final response"
                    );
                    return Ok(InvokeOutcome::FinalAnswer {
                        response: text,
                        steps,
                        model_calls,
                    });
                }
                ModelTurn::ToolCalls { preamble, calls } => {
                    if calls.is_empty() {
                        return Err(AgentError::InvalidResponse(
                            "model requested tool calls but supplied none".into(),
                        ));
                    }

                    if model_calls >= max_turns {
                        warn!(
                            model_calls,
                            pending_calls = calls.len(),
                            "Agent reached the turn limit; final tool batch not dispatched"
                        );
                        let partial = partial_answer(&preamble, &turn);
                        turn.commit();
                        return Ok(InvokeOutcome::TurnLimitExceeded {
                            partial,
                            steps,
                            model_calls,
                        });
                    }

                    info!(
                        calls = calls.len(),
                        tools = ?calls.iter().map(|c| c.tool_name.as_str()).collect::<Vec<_>>(),
                        "Agent dispatching tool batch"
                    );
                    let results = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            warn!(model_calls, "Invoke cancelled while tools were running");
                            return Err(AgentError::Cancelled);
                        }
                        results = dispatch_batch(&self.registry, &calls, strictness) => results,
                    };

                    turn.push(Message::assistant_tool_calls(preamble, calls.clone()));
                    for (call, result) in calls.into_iter().zip(results) {
                        let (success, output) = match result {
                            Ok(output) => (true, output),
                            Err(err) => (false, format!("error: {err}")),
                        };
                        turn.push(Message::tool(call.call_id.clone(), output.clone()));
                        steps.push(AgentStep {
                            call_id: call.call_id,
                            tool: call.tool_name,
                            input: call.arguments,
                            success,
                            output,
                        });
                    }
                }
            }
        }
    }
}

/// The preamble of the undispatched batch, or else the latest assistant text
/// staged during this invoke.
fn partial_answer(preamble: &str, turn: &SessionTurn<'_>) -> Option<String> {
    if !preamble.trim().is_empty() {
        return Some(preamble.to_string());
    }
    turn.staged()
        .iter()
        .rev()
        .find(|message| message.role == MessageRole::Assistant && !message.content.trim().is_empty())
        .map(|message| message.content.clone())
}
