//! Model traits

use super::types::ModelError;
use crate::types::{ModelRequest, ModelTurn};
use async_trait::async_trait;
use std::sync::Arc;

/// The model capability consumed by the turn loop.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Produce the next assistant turn for the given context.
    async fn generate_reply(&self, request: ModelRequest) -> Result<ModelTurn, ModelError>;
}

#[async_trait]
impl<P: ModelProvider + ?Sized> ModelProvider for Arc<P> {
    async fn generate_reply(&self, request: ModelRequest) -> Result<ModelTurn, ModelError> {
        (**self).generate_reply(request).await
    }
}

#[async_trait]
impl<P: ModelProvider + ?Sized> ModelProvider for Box<P> {
    async fn generate_reply(&self, request: ModelRequest) -> Result<ModelTurn, ModelError> {
        (**self).generate_reply(request).await
    }
}
