//! Scripted MCP stdio provider for the integration tests.
//!
//! Behaviour is selected with `MOCK_PROVIDER_MODE`:
//! - `normal` (default): full handshake, tools answered on worker threads
//! - `silent`: reads input but never answers, so handshakes time out
//! - `crash_on_call`: handshake succeeds, exits on the first `tools/call`
//! - `hang_on_call`: handshake succeeds, never answers `tools/call`
//! - `empty`: handshake succeeds with an empty tool list
//!
//! `MOCK_PROVIDER_INSTRUCTIONS` is returned as `instructions` from `initialize`.

use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use std::{env, process, thread};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Silent,
    CrashOnCall,
    HangOnCall,
    Empty,
}

impl Mode {
    fn from_env() -> Self {
        match env::var("MOCK_PROVIDER_MODE").as_deref() {
            Ok("silent") => Mode::Silent,
            Ok("crash_on_call") => Mode::CrashOnCall,
            Ok("hang_on_call") => Mode::HangOnCall,
            Ok("empty") => Mode::Empty,
            _ => Mode::Normal,
        }
    }
}

type Output = Arc<Mutex<io::Stdout>>;

/// Lets two concurrent `rendezvous` calls observe each other.
#[derive(Default)]
struct Rendezvous {
    arrived: Mutex<usize>,
    signal: Condvar,
}

fn main() {
    let mode = Mode::from_env();
    let out: Output = Arc::new(Mutex::new(io::stdout()));
    let meeting = Arc::new(Rendezvous::default());

    // Real servers often print banners; the client must skip them.
    write_raw(&out, "mock provider starting");

    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        if mode == Mode::Silent {
            continue;
        }

        let method = message
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let id = message.get("id").cloned();

        match (method.as_str(), id) {
            ("initialize", Some(id)) => {
                let mut result = json!({
                    "protocolVersion": "2025-06-18",
                    "serverInfo": { "name": "mock-provider", "version": "0.1.0" },
                    "capabilities": { "tools": { "listChanged": true } }
                });
                if let Ok(text) = env::var("MOCK_PROVIDER_INSTRUCTIONS") {
                    result["instructions"] = Value::String(text);
                }
                respond(&out, id, Ok(result));
            }
            ("notifications/initialized", None) => {
                send(
                    &out,
                    json!({
                        "jsonrpc": "2.0",
                        "method": "notifications/message",
                        "params": { "level": "info", "data": "mock ready" }
                    }),
                );
                send(&out, json!({ "jsonrpc": "2.0", "id": "srv-ping", "method": "ping" }));
            }
            ("tools/list", Some(id)) => {
                let tools = if mode == Mode::Empty {
                    Vec::new()
                } else {
                    catalogue()
                };
                respond(&out, id, Ok(json!({ "tools": tools })));
                send(
                    &out,
                    json!({ "jsonrpc": "2.0", "method": "notifications/tools/list_changed" }),
                );
            }
            ("tools/call", Some(id)) => match mode {
                Mode::CrashOnCall => process::exit(3),
                Mode::HangOnCall => {}
                _ => {
                    let out = Arc::clone(&out);
                    let meeting = Arc::clone(&meeting);
                    let params = message.get("params").cloned().unwrap_or(Value::Null);
                    thread::spawn(move || {
                        let outcome = call_tool(&params, &meeting);
                        respond(&out, id, outcome);
                    });
                }
            },
            (other, Some(id)) if !other.is_empty() => {
                respond(&out, id, Err((-32601, format!("method '{other}' not found"))));
            }
            _ => {}
        }
    }
}

fn catalogue() -> Vec<Value> {
    let text_only = |field: &str| {
        json!({
            "type": "object",
            "properties": { field: { "type": "string" } },
            "required": [field]
        })
    };
    vec![
        json!({ "name": "echo", "description": "Echo the text back", "inputSchema": text_only("text") }),
        json!({ "name": "web_search", "description": "Search the web", "inputSchema": text_only("query") }),
        json!({ "name": "multi", "description": "Two text blocks", "inputSchema": { "type": "object" } }),
        json!({ "name": "fail", "description": "Always reports a tool error", "inputSchema": { "type": "object" } }),
        json!({ "name": "rpc_error", "description": "Answers with a JSON-RPC error", "inputSchema": { "type": "object" } }),
        json!({ "name": "env", "description": "Read an environment variable", "inputSchema": text_only("name") }),
        json!({
            "name": "sleep",
            "description": "Sleep before answering",
            "inputSchema": {
                "type": "object",
                "properties": { "ms": { "type": "integer" } },
                "required": ["ms"]
            }
        }),
        json!({ "name": "rendezvous", "description": "Wait briefly for a second caller", "inputSchema": { "type": "object" } }),
    ]
}

fn call_tool(params: &Value, meeting: &Rendezvous) -> Result<Value, (i64, String)> {
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    let args = params.get("arguments").cloned().unwrap_or(Value::Null);
    let text_arg = |key: &str| args.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

    match name {
        "echo" => Ok(text(format!("echo: {}", text_arg("text")))),
        "web_search" => Ok(text(format!("Results for {}: 3 articles", text_arg("query")))),
        "multi" => Ok(json!({
            "content": [
                { "type": "text", "text": "line one" },
                { "type": "text", "text": "line two" }
            ]
        })),
        "fail" => Ok(json!({
            "content": [{ "type": "text", "text": "deliberate failure" }],
            "isError": true
        })),
        "rpc_error" => Err((-32000, "backend exploded".to_string())),
        "env" => {
            let value = env::var(text_arg("name")).unwrap_or_else(|_| "<unset>".to_string());
            Ok(text(value))
        }
        "sleep" => {
            let ms = args.get("ms").and_then(Value::as_u64).unwrap_or(0);
            thread::sleep(Duration::from_millis(ms));
            Ok(text(format!("slept {ms}ms")))
        }
        "rendezvous" => {
            let arrived = {
                let mut count = meeting.arrived.lock().unwrap_or_else(|e| e.into_inner());
                *count += 1;
                meeting.signal.notify_all();
                let (count, _) = meeting
                    .signal
                    .wait_timeout_while(count, Duration::from_millis(1500), |count| *count < 2)
                    .unwrap_or_else(|e| e.into_inner());
                *count
            };
            Ok(text(if arrived >= 2 { "met" } else { "alone" }.to_string()))
        }
        other => Err((-32602, format!("unknown tool '{other}'"))),
    }
}

fn text(value: String) -> Value {
    json!({ "content": [{ "type": "text", "text": value }] })
}

fn respond(out: &Output, id: Value, outcome: Result<Value, (i64, String)>) {
    let frame = match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        }),
    };
    send(out, frame);
}

fn send(out: &Output, frame: Value) {
    write_raw(out, &frame.to_string());
}

fn write_raw(out: &Output, line: &str) {
    let mut stdout = out.lock().unwrap_or_else(|e| e.into_inner());
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
}
