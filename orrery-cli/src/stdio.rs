use orrery_core::agent::{Agent, AgentError, AgentStep, InvokeOutcome};
use orrery_core::model::ModelProvider;
use orrery_core::session::Session;
use orrery_core::startup::ExcludedProvider;
use serde_json::to_string_pretty;
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

struct SessionState {
    session: Session,
    last_steps: Vec<AgentStep>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            session: Session::new(),
            last_steps: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.session = Session::new();
        self.last_steps.clear();
    }
}

enum LoopControl {
    Continue,
    Exit,
}

pub async fn run<P: ModelProvider>(
    agent: &Agent<P>,
    excluded: &[ExcludedProvider],
) -> Result<(), StdioError> {
    let mut stdout = io::stdout();
    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    let mut state = SessionState::new();

    print_banner(&mut stdout, agent, excluded).await?;

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => {
                write_line(&mut stdout, "\nInput closed. Leaving chat.").await?;
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            write_line(&mut stdout, "Goodbye.").await?;
            break;
        }

        if input.starts_with('/') {
            match handle_command(input, &mut state, agent, excluded, &mut stdout).await? {
                LoopControl::Continue => continue,
                LoopControl::Exit => break,
            }
        } else {
            handle_prompt(agent, &mut state, input, &mut stdout).await?;
        }
    }

    stdout.flush().await?;
    Ok(())
}

async fn handle_command<P: ModelProvider>(
    input: &str,
    state: &mut SessionState,
    agent: &Agent<P>,
    excluded: &[ExcludedProvider],
    stdout: &mut io::Stdout,
) -> Result<LoopControl, StdioError> {
    let name = input
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    debug!(command = %name, "Processing chat command");

    match name.as_str() {
        "help" | "?" => print_help(stdout).await?,
        "exit" | "quit" | "q" => {
            write_line(stdout, "Goodbye.").await?;
            return Ok(LoopControl::Exit);
        }
        "reset" | "clear" => {
            state.reset();
            write_line(
                stdout,
                &format!("History cleared. New session {}.", state.session.id()),
            )
            .await?;
        }
        "tools" => print_tools(stdout, agent, excluded).await?,
        "steps" => {
            if state.last_steps.is_empty() {
                write_line(stdout, "The last answer did not use any tools.").await?;
            } else {
                print_tool_steps(stdout, &state.last_steps).await?;
            }
        }
        other => {
            write_line(
                stdout,
                &format!("Unknown command '/{other}'. Type /help for the list."),
            )
            .await?;
        }
    }
    Ok(LoopControl::Continue)
}

async fn handle_prompt<P: ModelProvider>(
    agent: &Agent<P>,
    state: &mut SessionState,
    message: &str,
    stdout: &mut io::Stdout,
) -> Result<(), StdioError> {
    info!(session_id = state.session.id(), "Processing chat message");
    match invoke_interruptible(agent, &mut state.session, message).await {
        Ok(InvokeOutcome::FinalAnswer { response, steps, .. }) => {
            write_line(stdout, "\nagent>").await?;
            write_line(stdout, &response).await?;
            announce_steps(stdout, &steps).await?;
            state.last_steps = steps;
        }
        Ok(InvokeOutcome::TurnLimitExceeded {
            partial,
            steps,
            model_calls,
        }) => {
            write_line(
                stdout,
                &format!("\nStopped after {model_calls} model calls without a final answer."),
            )
            .await?;
            if let Some(partial) = partial {
                write_line(stdout, "Partial answer:").await?;
                write_line(stdout, &partial).await?;
            }
            announce_steps(stdout, &steps).await?;
            state.last_steps = steps;
        }
        Err(AgentError::Cancelled) => {
            write_line(stdout, "\nCancelled. The conversation is unchanged.").await?;
            state.last_steps.clear();
        }
        Err(err) => {
            error!(%err, "Invoke failed in chat mode");
            write_line(stdout, "\nThe request failed:").await?;
            write_line(stdout, &err.user_message()).await?;
            state.last_steps.clear();
        }
    }
    write_line(stdout, "").await?;
    stdout.flush().await?;
    Ok(())
}

/// Run one invoke, cancelling it on Ctrl-C.
async fn invoke_interruptible<P: ModelProvider>(
    agent: &Agent<P>,
    session: &mut Session,
    message: &str,
) -> Result<InvokeOutcome, AgentError> {
    let token = CancellationToken::new();
    let invoke = agent.invoke_with_cancel(session, message, token.clone());
    tokio::pin!(invoke);
    loop {
        tokio::select! {
            result = &mut invoke => return result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    error!(%err, "Ctrl-C handler unavailable");
                }
                info!("Ctrl-C received; cancelling invoke");
                token.cancel();
            }
        }
    }
}

async fn announce_steps(stdout: &mut io::Stdout, steps: &[AgentStep]) -> io::Result<()> {
    if steps.is_empty() {
        return Ok(());
    }
    let failed = steps.iter().filter(|step| !step.success).count();
    let note = if failed == 0 {
        format!("({} tool call(s); /steps for details)", steps.len())
    } else {
        format!(
            "({} tool call(s), {failed} failed; /steps for details)",
            steps.len()
        )
    };
    write_line(stdout, &note).await
}

async fn print_tool_steps(stdout: &mut io::Stdout, steps: &[AgentStep]) -> io::Result<()> {
    write_line(stdout, "\nTool steps:").await?;
    for (index, step) in steps.iter().enumerate() {
        let status = if step.success { "ok" } else { "failed" };
        write_line(
            stdout,
            &format!("  {}. {} [{}] ({})", index + 1, step.tool, status, step.call_id),
        )
        .await?;

        if !step.input.is_null() {
            let input = to_string_pretty(&step.input).unwrap_or_else(|_| step.input.to_string());
            for line in input.lines() {
                write_line(stdout, &format!("     in : {line}")).await?;
            }
        }
        for line in preview(&step.output).lines() {
            write_line(stdout, &format!("     out: {line}")).await?;
        }
    }
    Ok(())
}

async fn print_tools<P: ModelProvider>(
    stdout: &mut io::Stdout,
    agent: &Agent<P>,
    excluded: &[ExcludedProvider],
) -> io::Result<()> {
    let registry = agent.registry();
    let specs = registry.specs();
    if specs.is_empty() {
        write_line(stdout, "\nNo tools are registered.").await?;
    } else {
        write_line(stdout, "\nAvailable tools:").await?;
        for spec in &specs {
            let source = registry.source_of(&spec.name).unwrap_or("?");
            write_line(
                stdout,
                &format!("  - {} [{}]: {}", spec.name, source, preview(&spec.description)),
            )
            .await?;
        }
    }
    for provider in registry.providers() {
        write_line(
            stdout,
            &format!(
                "  provider {} is {} ({} pending)",
                provider.name(),
                provider.state(),
                provider.pending_calls()
            ),
        )
        .await?;
    }
    for provider in excluded {
        write_line(
            stdout,
            &format!("  provider {} unavailable: {}", provider.name, provider.reason),
        )
        .await?;
    }
    Ok(())
}

async fn print_banner<P: ModelProvider>(
    stdout: &mut io::Stdout,
    agent: &Agent<P>,
    excluded: &[ExcludedProvider],
) -> io::Result<()> {
    write_line(stdout, "orrery chat is ready.").await?;
    write_line(
        stdout,
        &format!(
            "{} tool(s) registered, up to {} model calls per message.",
            agent.registry().len(),
            agent.options().max_turns.max(1)
        ),
    )
    .await?;
    if !excluded.is_empty() {
        let names: Vec<&str> = excluded.iter().map(|p| p.name.as_str()).collect();
        write_line(
            stdout,
            &format!("Running without provider(s): {}", names.join(", ")),
        )
        .await?;
    }
    write_line(stdout, "Type /help for commands, Ctrl-C cancels a running request.").await
}

async fn print_help(stdout: &mut io::Stdout) -> io::Result<()> {
    write_line(stdout, "\nCommands:").await?;
    write_line(stdout, "  /help      Show this help").await?;
    write_line(stdout, "  /tools     List registered tools and provider states").await?;
    write_line(stdout, "  /steps     Show tool calls behind the last answer").await?;
    write_line(stdout, "  /reset     Forget the conversation and start a new session").await?;
    write_line(stdout, "  /exit      Leave (also: exit, quit)").await?;
    write_line(stdout, "Anything else is sent to the agent.").await
}

async fn write_line(stdout: &mut io::Stdout, line: &str) -> io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    Ok(())
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 400;
    if text.chars().count() <= LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(LIMIT).collect();
    format!("{cut}...")
}
