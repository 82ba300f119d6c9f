mod cli;
mod stdio;

use clap::Parser;
use cli::{Cli, RunMode};
use orrery_core::agent::{Agent, AgentOptions};
use orrery_core::model::ModelFactory;
use orrery_core::session::Session;
use orrery_core::startup::build_registry;
use orrery_core::AppConfig;
use serde_json::{Value, json};
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    info!("Starting orrery");
    debug!(mode = ?cli.mode, config = ?cli.config, "CLI arguments parsed");

    let config = AppConfig::load(cli.config.as_deref()).inspect_err(|err| {
        error!(%err, "Failed to load configuration");
    })?;

    let provider = ModelFactory::create(&config.model).map_err(|err| {
        eprintln!("{}", err.user_message());
        err
    })?;

    let report = build_registry(&config).await.map_err(|err| {
        eprintln!("{}", err.user_message());
        err
    })?;
    for excluded in &report.excluded {
        warn!(provider = excluded.name.as_str(), reason = excluded.reason.as_str(), "Continuing without tool provider");
    }
    let registry = Arc::new(report.registry);

    let mut options = AgentOptions::from_settings(&config.agent);
    if let Some(system) = cli.system.clone() {
        options = options.with_system_prompt(system);
    }
    if let Some(max_turns) = cli.max_turns {
        options = options.with_max_turns(max_turns);
    }
    let agent = Agent::new(provider, Arc::clone(&registry), options);

    info!(mode = ?cli.mode, tools = registry.len(), "Running in selected mode");
    let result = match cli.mode {
        RunMode::Chat => stdio::run(&agent, &report.excluded)
            .await
            .map_err(|err| Box::new(err) as Box<dyn Error>),
        RunMode::Once => run_once(&agent, &cli).await,
    };

    registry.shutdown().await;
    info!("orrery finished");
    result
}

async fn run_once<P>(agent: &Agent<P>, cli: &Cli) -> Result<(), Box<dyn Error>>
where
    P: orrery_core::model::ModelProvider,
{
    let prompt = load_prompt(cli)?;
    let mut session = Session::new();
    let outcome = match agent.invoke(&mut session, prompt).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%err, "Invoke failed");
            eprintln!("{}", err.user_message());
            return Err(err.into());
        }
    };

    let mut output = json!({ "session_id": session.id() });
    if let (Value::Object(map), Value::Object(extra)) =
        (&mut output, serde_json::to_value(&outcome)?)
    {
        map.extend(extra);
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path.display(), "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return non_empty(content);
    }

    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        return non_empty(cli.prompt.join(" "));
    }

    if !io::stdin().is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return non_empty(buffer);
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, --prompt-file, or stdin".into())
}

fn non_empty(prompt: String) -> Result<String, Box<dyn Error>> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err("prompt is empty".into());
    }
    Ok(trimmed.to_string())
}
