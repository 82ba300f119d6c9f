//! # orrery-core
//!
//! Tool orchestration for the orrery agent runtime.
//!
//! - [`tooling`] - tool descriptors, argument validation, the MCP stdio
//!   provider client, and the registry that merges every tool source
//! - [`agent`] - the turn loop that alternates model calls and tool dispatch
//! - [`builtin`] - compiled-in tools
//! - [`startup`] - builds a registry from an [`AppConfig`]
//! - [`model`] - the model capability boundary and its HTTP adapter
//! - [`config`] - TOML configuration

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, builtin, startup, tooling};
pub use config::{AppConfig, ConfigError};
pub use domain::types;
pub use infrastructure::model;

pub use orrery_session as session;
