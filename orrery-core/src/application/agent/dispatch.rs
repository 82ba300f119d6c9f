use crate::application::tooling::{Strictness, ToolError, ToolRegistry};
use crate::session::ToolCallRequest;
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, warn};

/// Run one batch of tool calls concurrently. Results come back in the order
/// of `calls`, whatever order they complete in.
pub(super) async fn dispatch_batch(
    registry: &ToolRegistry,
    calls: &[ToolCallRequest],
    strictness: Strictness,
) -> Vec<Result<String, ToolError>> {
    join_all(calls.iter().map(|call| async move {
        let started = Instant::now();
        let result = registry
            .dispatch_with(&call.tool_name, call.arguments.clone(), strictness)
            .await;
        match &result {
            Ok(output) => debug!(
                tool = call.tool_name.as_str(),
                call_id = call.call_id.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                bytes = output.len(),
                "Tool call completed"
            ),
            Err(err) => warn!(
                tool = call.tool_name.as_str(),
                call_id = call.call_id.as_str(),
                kind = err.kind(),
                error = %err,
                "Tool call failed"
            ),
        }
        result
    }))
    .await
}
