//! # Agent Module
//!
//! The turn loop. One [`Agent::invoke`] call drives a single user message to
//! completion: the model is asked for a reply, any tool calls it requests are
//! dispatched through the [`ToolRegistry`](crate::tooling::ToolRegistry), the
//! results are folded back into the conversation, and the model is asked
//! again until it answers in plain text or the turn cap is hit.
//!
//! ## Key Types
//!
//! - [`Agent`] - The turn loop executor
//! - [`AgentOptions`] - System prompt, turn cap and validation strictness
//! - [`InvokeOutcome`] - Final answer or turn-limit report
//! - [`AgentStep`] - One dispatched tool call and its result
//! - [`AgentError`] - Fatal errors; tool failures never show up here
//!
//! ## Session handling
//!
//! Messages produced during an invoke are staged on a
//! [`SessionTurn`](crate::session::SessionTurn) and only committed when the
//! invoke finishes with an outcome. A model failure or a cancellation drops
//! the staged turn, so the session is left exactly as it was.

mod dispatch;
mod errors;
mod instructions;
mod models;
mod runner;


pub use errors::AgentError;
pub use instructions::compose_system_prompt;
pub use models::{AgentOptions, AgentStep, InvokeOutcome};
pub use runner::Agent;
