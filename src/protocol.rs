use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    orchestrator::{CrisisRequest, PipelineOutcome},
    router::{CrisisCategory, Mood},
    types::{SessionId, StepId, WorsenedResponse},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Assess(CrisisRequest),
    Guide(CrisisRequest),
    Recheck {
        session_id: SessionId,
        response: WorsenedResponse,
    },
    CompleteStep {
        session_id: SessionId,
        step_id: StepId,
    },
    Exit,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum WireMessage {
    Assess {
        user_text: String,
        #[serde(default)]
        session_id: Option<SessionId>,
        #[serde(default)]
        mood: Option<Mood>,
        #[serde(default)]
        category: Option<CrisisCategory>,
    },
    Guide {
        user_text: String,
        #[serde(default)]
        session_id: Option<SessionId>,
        #[serde(default)]
        mood: Option<Mood>,
        #[serde(default)]
        category: Option<CrisisCategory>,
    },
    Recheck {
        session_id: SessionId,
        user_worsened_response: WorsenedResponse,
    },
    CompleteStep {
        session_id: SessionId,
        step_id: StepId,
    },
    Exit,
}

pub fn parse_client_message(line: &str) -> Result<ClientMessage, serde_json::Error> {
    let wire: WireMessage = serde_json::from_str(line)?;
    let message = match wire {
        WireMessage::Assess {
            user_text,
            session_id,
            mood,
            category,
        } => ClientMessage::Assess(CrisisRequest {
            session_id,
            user_text,
            mood,
            category,
        }),
        WireMessage::Guide {
            user_text,
            session_id,
            mood,
            category,
        } => ClientMessage::Guide(CrisisRequest {
            session_id,
            user_text,
            mood,
            category,
        }),
        WireMessage::Recheck {
            session_id,
            user_worsened_response,
        } => ClientMessage::Recheck {
            session_id,
            response: user_worsened_response,
        },
        WireMessage::CompleteStep {
            session_id,
            step_id,
        } => ClientMessage::CompleteStep {
            session_id,
            step_id,
        },
        WireMessage::Exit => ClientMessage::Exit,
    };
    Ok(message)
}

/// One response line. Outcomes carry their own `status` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Outcome(PipelineOutcome),
    Ack(Ack),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ack {
    StepCompleted {
        session_id: SessionId,
        completed_steps: BTreeSet<StepId>,
    },
    InvalidRequest {
        message: String,
    },
}

impl ServerMessage {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::Ack(Ack::InvalidRequest {
            message: message.into(),
        })
    }

    /// Serializes to a single NDJSON line, newline included.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
