//! # orrery-session
//!
//! Ordered conversation history for the orrery agent runtime.
//!
//! A [`Session`] is append-only. The turn loop never writes into it directly:
//! it opens a [`SessionTurn`] with [`Session::begin_turn`], stages the
//! messages produced while the model and tools run, and either commits them
//! in one step or drops the turn, which leaves the history untouched.
//!
//! `begin_turn` borrows the session mutably, so a second invocation against
//! the same session cannot start while a turn is open.

mod message;
mod session;

pub use message::{Message, MessageRole, ToolCallRequest};
pub use session::{Session, SessionError, SessionTurn};
