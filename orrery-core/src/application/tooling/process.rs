//! Client for one MCP tool provider running as a child process.
//!
//! Frames are newline-delimited JSON-RPC 2.0 messages on the child's
//! stdin/stdout. A background reader task owns stdout and routes responses to
//! the waiting caller through the pending-call table.

use super::descriptor::{ToolDescriptor, ToolInvoker};
use super::error::ToolError;
use super::schema::{InputSchema, ToolArgs};
use crate::config::ProviderConfig;
use crate::constants::PROTOCOL_VERSION;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, Semaphore, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Lifecycle of a provider connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Spawned, handshake not finished.
    Starting,
    /// Discovery completed; calls are accepted.
    Ready,
    /// Handshake failed or timed out; the process has been released.
    Degraded,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Starting => "starting",
            ConnectionState::Ready => "ready",
            ConnectionState::Degraded => "degraded",
            ConnectionState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Tool advertised by a provider in its `tools/list` reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

type PendingTable = HashMap<String, oneshot::Sender<Result<Value, ToolError>>>;

#[derive(Clone)]
pub struct ProviderClient {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    config: ProviderConfig,
    state: Mutex<ConnectionState>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    child: AsyncMutex<Option<Child>>,
    pending: Mutex<PendingTable>,
    id_counter: AtomicU64,
    closing: AtomicBool,
    /// Set once stdout has closed; no pending entry may outlive it.
    disconnected: AtomicBool,
    instructions: Mutex<Option<String>>,
    catalogue: Mutex<Vec<RemoteToolInfo>>,
    queue: Semaphore,
}

impl ProviderClient {
    /// Launch the provider process. The connection starts in
    /// [`ConnectionState::Starting`]; call [`ProviderClient::discover`] next.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ProviderConfig) -> Result<Self, ToolError> {
        let mut command = Command::new(&config.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.workdir {
            command.current_dir(dir);
        }
        if !config.args.is_empty() {
            command.args(&config.args);
        }
        for (key, value) in &config.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| {
            ToolError::unavailable(
                &config.name,
                format!("failed to spawn `{}`: {source}", config.command.display()),
            )
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            let _ = child.start_kill();
            return Err(ToolError::unavailable(
                &config.name,
                "failed to capture provider stdio",
            ));
        };

        let permits = if config.interleaved {
            Semaphore::MAX_PERMITS
        } else {
            1
        };
        info!(
            provider = %config.name,
            command = %config.command_line(),
            pid = ?child.id(),
            "Spawned tool provider"
        );

        let inner = Arc::new(ProviderInner {
            config,
            state: Mutex::new(ConnectionState::Starting),
            writer: AsyncMutex::new(Some(BufWriter::new(stdin))),
            child: AsyncMutex::new(Some(child)),
            pending: Mutex::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
            closing: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            instructions: Mutex::new(None),
            catalogue: Mutex::new(Vec::new()),
            queue: Semaphore::new(permits),
        });

        let reader = Arc::clone(&inner);
        tokio::spawn(async move {
            reader.reader_loop(stdout).await;
        });

        Ok(Self { inner })
    }

    /// Spawn and run discovery in one step.
    pub async fn connect(config: ProviderConfig) -> Result<Self, ToolError> {
        let client = Self::spawn(config)?;
        client.discover().await?;
        Ok(client)
    }

    /// Run the `initialize` / `tools/list` handshake, bounded by the
    /// configured handshake timeout. On failure the process is released and
    /// the connection is left `Degraded` (or `Closed` if the process died).
    pub async fn discover(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let inner = &self.inner;
        if inner.state() != ConnectionState::Starting {
            return Err(ToolError::unavailable(
                &inner.config.name,
                format!("cannot run discovery in state {}", inner.state()),
            ));
        }

        let limit = inner.config.handshake_timeout;
        let outcome = match timeout(limit, inner.handshake()).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::unavailable(
                &inner.config.name,
                format!("handshake timed out after {limit:?}"),
            )),
        };

        match outcome {
            Ok(tools) => {
                info!(
                    provider = %inner.config.name,
                    tools = tools.len(),
                    "Tool provider ready"
                );
                *lock(&inner.catalogue) = tools;
                inner.set_state(ConnectionState::Ready);
                Ok(self.descriptors())
            }
            Err(err) => {
                warn!(provider = %inner.config.name, %err, "Tool provider handshake failed");
                inner.mark_degraded();
                inner.release(Duration::ZERO).await;
                Err(err)
            }
        }
    }

    /// Invoke a tool on this provider.
    pub async fn call(&self, tool: &str, arguments: Value) -> Result<String, ToolError> {
        let inner = &self.inner;
        inner.ensure_ready()?;

        let _permit = inner
            .queue
            .acquire()
            .await
            .map_err(|_| inner.closed_error())?;
        inner.ensure_ready()?;

        let params = json!({
            "name": tool,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });

        let limit = inner.config.call_timeout;
        debug!(provider = %inner.config.name, tool, "Calling remote tool");
        let response = match timeout(limit, inner.send_request("tools/call", params)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    provider = %inner.config.name,
                    tool,
                    timeout = ?limit,
                    "Remote tool call timed out"
                );
                return Err(ToolError::ToolTimeout {
                    provider: inner.config.name.clone(),
                    tool: tool.to_string(),
                    timeout: limit,
                });
            }
        };

        call_result_text(tool, &response)
    }

    /// Stop accepting calls, close the provider's stdin, and wait up to the
    /// shutdown grace period before killing it. Safe to call more than once.
    pub async fn close(&self) {
        let inner = &self.inner;
        if inner.closing.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.queue.close();
        info!(provider = %inner.config.name, "Closing tool provider");
        inner.release(inner.config.shutdown_grace).await;
        inner.set_state(ConnectionState::Closed);
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    pub fn pending_calls(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// Usage guidance from the provider's `initialize` reply.
    pub fn instructions(&self) -> Option<String> {
        lock(&self.inner.instructions).clone()
    }

    pub fn tools(&self) -> Vec<RemoteToolInfo> {
        lock(&self.inner.catalogue).clone()
    }

    /// One descriptor per discovered tool, each routing through this connection.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools()
            .into_iter()
            .map(|info| {
                let invoker = Arc::new(RemoteInvoker {
                    client: self.clone(),
                    tool: info.name.clone(),
                });
                ToolDescriptor::new(
                    info.name,
                    info.description,
                    InputSchema::from_value(info.input_schema),
                    invoker,
                )
            })
            .collect()
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("name", &self.inner.config.name)
            .field("state", &self.inner.state())
            .finish_non_exhaustive()
    }
}

struct RemoteInvoker {
    client: ProviderClient,
    tool: String,
}

#[async_trait]
impl ToolInvoker for RemoteInvoker {
    async fn invoke(&self, args: ToolArgs) -> Result<String, ToolError> {
        self.client.call(&self.tool, args.into_value()).await
    }
}

/// Removes a pending entry when the waiting call is dropped, whether it
/// completed, timed out, or was cancelled.
struct PendingGuard<'a> {
    pending: &'a Mutex<PendingTable>,
    id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.id);
    }
}

impl ProviderInner {
    fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = lock(&self.state);
        let previous = *state;
        if previous != next {
            debug!(provider = %self.config.name, from = %previous, to = %next, "Provider state change");
            *state = next;
        }
    }

    fn mark_degraded(&self) {
        let mut state = lock(&self.state);
        if *state == ConnectionState::Starting {
            *state = ConnectionState::Degraded;
        }
    }

    /// Closed, unless the handshake already parked the connection as Degraded.
    fn mark_closed(&self) {
        let mut state = lock(&self.state);
        if *state != ConnectionState::Degraded {
            *state = ConnectionState::Closed;
        }
    }

    fn closed_error(&self) -> ToolError {
        if self.closing.load(Ordering::SeqCst) {
            ToolError::unavailable(&self.config.name, "connection closed")
        } else {
            ToolError::ProviderCrashed {
                provider: self.config.name.clone(),
            }
        }
    }

    fn ensure_ready(&self) -> Result<(), ToolError> {
        match self.state() {
            ConnectionState::Ready => Ok(()),
            ConnectionState::Closed => Err(self.closed_error()),
            other => Err(ToolError::unavailable(
                &self.config.name,
                format!("connection is {other}"),
            )),
        }
    }

    async fn handshake(&self) -> Result<Vec<RemoteToolInfo>, ToolError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let init_result = self.send_request("initialize", params).await?;
        if let Some(text) = init_result.get("instructions").and_then(Value::as_str) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                *lock(&self.instructions) = Some(trimmed.to_string());
            }
        }
        self.send_notification("notifications/initialized", json!({}))
            .await?;

        let listing = self.send_request("tools/list", json!({})).await?;
        Ok(self.parse_catalogue(&listing))
    }

    fn parse_catalogue(&self, listing: &Value) -> Vec<RemoteToolInfo> {
        let Some(entries) = listing.get("tools").and_then(Value::as_array) else {
            return Vec::new();
        };
        let mut tools = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                warn!(provider = %self.config.name, "Skipping advertised tool without a name");
                continue;
            };
            tools.push(RemoteToolInfo {
                name: name.to_string(),
                description: entry
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                input_schema: entry
                    .get("inputSchema")
                    .cloned()
                    .unwrap_or_else(|| json!({ "type": "object" })),
            });
        }
        tools
    }

    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout) {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            let raw = match lines.next_line().await {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(err) => {
                    warn!(provider = %self.config.name, %err, "Failed to read from tool provider");
                    break;
                }
            };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('\u{1b}') {
                debug!(
                    provider = %self.config.name,
                    line = trimmed,
                    "skipping non-JSON ANSI log line from provider"
                );
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => self.process_inbound_message(value).await,
                Err(source) => {
                    warn!(
                        provider = %self.config.name,
                        line = trimmed,
                        %source,
                        "received invalid JSON from provider"
                    );
                }
            }
        }

        self.on_disconnect().await;
    }

    async fn on_disconnect(&self) {
        if self.disconnect_expected() {
            debug!(provider = %self.config.name, "Provider output closed");
        } else {
            warn!(provider = %self.config.name, "Tool provider exited unexpectedly");
        }
        // Flag and state go first so a call racing the drain sees them.
        self.disconnected.store(true, Ordering::SeqCst);
        self.mark_closed();
        self.queue.close();
        self.fail_all_pending(|| self.disconnect_error());
        self.reap().await;
    }

    fn disconnect_expected(&self) -> bool {
        self.closing.load(Ordering::SeqCst) || self.state() == ConnectionState::Degraded
    }

    fn disconnect_error(&self) -> ToolError {
        if self.disconnect_expected() {
            ToolError::unavailable(&self.config.name, "connection closed")
        } else {
            ToolError::ProviderCrashed {
                provider: self.config.name.clone(),
            }
        }
    }

    async fn process_inbound_message(&self, value: Value) {
        match (value.get("id").cloned(), value.get("method").is_some()) {
            (Some(id), true) => self.handle_server_request(id, &value).await,
            (Some(id), false) => self.handle_response(&id, value),
            (None, true) => self.handle_notification(&value),
            (None, false) => {
                debug!(provider = %self.config.name, "ignoring frame without id or method");
            }
        }
    }

    fn handle_response(&self, id: &Value, value: Value) {
        let Some(key) = response_key(id) else {
            return;
        };

        let Some(sender) = lock(&self.pending).remove(&key) else {
            debug!(
                provider = %self.config.name,
                response_id = key,
                "received response for unknown or abandoned request"
            );
            return;
        };

        let outcome = match value.get("error") {
            Some(error) => Err(ToolError::Rpc {
                provider: self.config.name.clone(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            }),
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = sender.send(outcome);
    }

    async fn handle_server_request(&self, id: Value, value: &Value) {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let reply = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            warn!(
                provider = %self.config.name,
                method,
                "provider sent unsupported request"
            );
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": -32601,
                    "message": format!("client does not implement method '{method}'"),
                }
            })
        };
        if let Err(err) = self.write_message(&reply).await {
            debug!(provider = %self.config.name, %err, "failed to answer provider request");
        }
    }

    fn handle_notification(&self, value: &Value) {
        let Some(method) = value.get("method").and_then(Value::as_str) else {
            return;
        };
        if method == "notifications/tools/list_changed" {
            info!(
                provider = %self.config.name,
                "provider reported a changed tool list; keeping the catalogue from discovery"
            );
        } else {
            debug!(provider = %self.config.name, method, "received notification from provider");
        }
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id.clone(), tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            id: id.clone(),
        };
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(self.disconnect_error());
        }

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        self.write_message(&payload).await?;

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolError::ProviderCrashed {
                provider: self.config.name.clone(),
            }),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.write_message(&payload).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolError> {
        let mut encoded = message.to_string();
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let stream = writer
            .as_mut()
            .ok_or_else(|| ToolError::unavailable(&self.config.name, "connection closed"))?;
        let written = async {
            stream.write_all(encoded.as_bytes()).await?;
            stream.flush().await
        }
        .await;
        written.map_err(|err| {
            debug!(provider = %self.config.name, %err, "write to provider failed");
            ToolError::ProviderCrashed {
                provider: self.config.name.clone(),
            }
        })
    }

    /// Close stdin, give the child `grace` to exit, then kill it.
    async fn release(&self, grace: Duration) {
        let child = self.child.lock().await.take();
        self.writer.lock().await.take();

        let Some(mut child) = child else {
            return;
        };
        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(provider = %self.config.name, %status, "Tool provider exited");
            }
            Ok(Err(err)) => {
                warn!(provider = %self.config.name, %err, "Failed to wait for tool provider");
            }
            Err(_) => {
                if !grace.is_zero() {
                    warn!(
                        provider = %self.config.name,
                        grace = ?grace,
                        "Tool provider did not exit in time; killing it"
                    );
                }
                if let Err(err) = child.kill().await {
                    debug!(
                        provider = %self.config.name,
                        %err,
                        "failed to kill provider process (may have already exited)"
                    );
                }
            }
        }
    }

    /// Reap the child after its output closed on its own.
    async fn reap(&self) {
        let child = self.child.lock().await.take();
        self.writer.lock().await.take();
        if let Some(mut child) = child {
            let _ = child.start_kill();
            match child.wait().await {
                Ok(status) => debug!(provider = %self.config.name, %status, "Reaped tool provider"),
                Err(err) => debug!(provider = %self.config.name, %err, "Failed to reap tool provider"),
            }
        }
    }

    fn fail_all_pending(&self, error: impl Fn() -> ToolError) {
        let drained: Vec<_> = lock(&self.pending).drain().collect();
        for (_, sender) in drained {
            let _ = sender.send(Err(error()));
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("call-{id}")
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

/// Flatten a `tools/call` result into the text handed back to the model.
fn call_result_text(tool: &str, result: &Value) -> Result<String, ToolError> {
    let mut parts = Vec::new();
    if let Some(blocks) = result.get("content").and_then(Value::as_array) {
        for block in blocks {
            match block.get("text").and_then(Value::as_str) {
                Some(text) if block.get("type").and_then(Value::as_str) == Some("text") => {
                    parts.push(text.to_string())
                }
                _ => parts.push(block.to_string()),
            }
        }
    } else if let Some(structured) = result.get("structuredContent") {
        parts.push(structured.to_string());
    }
    let text = parts.join("\n");

    if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
        let message = if text.is_empty() {
            "provider reported an error without details".to_string()
        } else {
            text
        };
        return Err(ToolError::execution(tool, message));
    }
    Ok(text)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
