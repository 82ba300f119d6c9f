use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "orrery",
    version,
    about = "Tool-using conversational agent over local tools and MCP providers"
)]
pub struct Cli {
    /// Configuration file (defaults to config/orrery.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Replace the configured system prompt
    #[arg(long)]
    pub system: Option<String>,
    /// Override the turn cap for each invoke
    #[arg(long)]
    pub max_turns: Option<usize>,
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = RunMode::Chat)]
    pub mode: RunMode,
    #[arg()]
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Interactive conversation on stdin/stdout
    Chat,
    /// Answer a single prompt and print the outcome as JSON
    Once,
}
