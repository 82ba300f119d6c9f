use crate::message::{Message, MessageRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to encode or decode session snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Ordered message history for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    history: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Last assistant message without pending tool calls, if any.
    pub fn last_answer(&self) -> Option<&Message> {
        self.history
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::Assistant && !message.has_tool_calls())
    }

    /// Open a staged turn. Messages pushed onto the turn become part of the
    /// history only when [`SessionTurn::commit`] is called.
    pub fn begin_turn(&mut self) -> SessionTurn<'_> {
        SessionTurn {
            session: self,
            staged: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages produced by one in-flight invocation, not yet part of the session.
///
/// Dropping a turn discards everything staged on it.
#[derive(Debug)]
pub struct SessionTurn<'a> {
    session: &'a mut Session,
    staged: Vec<Message>,
}

impl SessionTurn<'_> {
    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    pub fn push(&mut self, message: Message) {
        self.staged.push(message);
    }

    pub fn staged(&self) -> &[Message] {
        &self.staged
    }

    /// Committed history followed by the staged messages.
    pub fn transcript(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.session.history.len() + self.staged.len());
        messages.extend(self.session.history.iter().cloned());
        messages.extend(self.staged.iter().cloned());
        messages
    }

    /// Append the staged messages to the session. Returns how many were added.
    pub fn commit(self) -> usize {
        let count = self.staged.len();
        self.session.history.extend(self.staged);
        count
    }
}
