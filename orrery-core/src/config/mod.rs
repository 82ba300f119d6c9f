pub mod agent;
pub mod app;
pub mod error;
pub mod loader;
pub mod model;
pub mod provider;

pub use crate::constants::CONFIG_PATH;

pub use agent::{AgentSettings, ToolSettings};
pub use app::AppConfig;
pub use error::ConfigError;
pub use model::{ModelConfig, ModelPreset};
pub use provider::{ProviderConfig, preset_providers};
