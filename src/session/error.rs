use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionErrorKind {
    UnknownSession,
    UnknownStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SessionError {}

pub fn unknown_session(session_id: &str) -> SessionError {
    SessionError::new(
        SessionErrorKind::UnknownSession,
        format!("no session with id {session_id}"),
    )
}

pub fn unknown_step(session_id: &str, step_id: u32) -> SessionError {
    SessionError::new(
        SessionErrorKind::UnknownStep,
        format!("step {step_id} is not part of the current plan for session {session_id}"),
    )
}
