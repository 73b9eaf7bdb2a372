use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorKind {
    Timeout,
    Unreachable,
    MalformedResponse,
}

impl OracleErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleError {
    pub kind: OracleErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
}

impl OracleError {
    pub fn new(kind: OracleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(
                f,
                "{} ({}, status={})",
                self.message,
                self.kind.as_str(),
                status
            ),
            None => write!(f, "{} ({})", self.message, self.kind.as_str()),
        }
    }
}

impl std::error::Error for OracleError {}

pub fn timeout(message: impl Into<String>) -> OracleError {
    OracleError::new(OracleErrorKind::Timeout, message)
}

pub fn unreachable(message: impl Into<String>) -> OracleError {
    OracleError::new(OracleErrorKind::Unreachable, message)
}

pub fn malformed_response(message: impl Into<String>) -> OracleError {
    OracleError::new(OracleErrorKind::MalformedResponse, message)
}
