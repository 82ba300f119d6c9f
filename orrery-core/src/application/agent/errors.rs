use crate::infrastructure::model::ModelError;
use thiserror::Error;

/// Errors that end an invoke. Tool and provider failures are folded into the
/// conversation instead and never surface here.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),
    #[error("invocation cancelled")]
    Cancelled,
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::InvalidResponse(_) => {
                "The model returned a response that could not be understood. Please try again."
                    .to_string()
            }
            AgentError::Cancelled => "Request cancelled; the conversation is unchanged.".to_string(),
        }
    }
}
