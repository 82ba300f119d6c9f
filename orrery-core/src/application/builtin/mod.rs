//! Compiled-in tools.
//!
//! Each built-in is a [`LocalTool`] selected by name from the `[tools]`
//! config table.

mod kimi_cli;
mod weather;

pub use kimi_cli::KimiCli;
pub use weather::Weather;

use crate::application::tooling::LocalTool;
use std::sync::Arc;

/// Names accepted in `tools.builtin`.
pub const BUILTIN_NAMES: &[&str] = &[weather::NAME, kimi_cli::NAME];

/// Instantiate a built-in by name.
pub fn builtin(name: &str) -> Option<Arc<dyn LocalTool>> {
    match name {
        weather::NAME => Some(Arc::new(Weather)),
        kimi_cli::NAME => Some(Arc::new(KimiCli::default())),
        _ => None,
    }
}
