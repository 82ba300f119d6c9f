//! Model infrastructure module
//!
//! The model call is a black box behind [`ModelProvider`]. One HTTP adapter
//! ships with the crate.
//!
//! # Structure
//! - `types` - Error type
//! - `traits` - ModelProvider trait
//! - `adapter` - Message format adapter for OpenAI-style chat payloads
//! - `factory` - Builds a client from configuration
//! - `clients` - Individual client implementations

pub mod adapter;
pub mod clients;
pub mod factory;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use crate::types::{ModelRequest, ModelTurn};
pub use clients::OpenAiCompatibleClient;
pub use factory::ModelFactory;
pub use traits::ModelProvider;
pub use types::ModelError;
