use std::{collections::BTreeMap, fmt, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RequestId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OraclePurpose {
    Normalize,
    Classify,
    AssessRisk,
    PlanActions,
    GuideStep,
    Recheck,
}

impl OraclePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::Classify => "classify",
            Self::AssessRisk => "assess_risk",
            Self::PlanActions => "plan_actions",
            Self::GuideStep => "guide_step",
            Self::Recheck => "recheck",
        }
    }

    /// Normalization answers in plain text; every other purpose answers with a JSON object.
    pub fn expects_json(self) -> bool {
        !matches!(self, Self::Normalize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<usize> for ContextValue {
    fn from(value: usize) -> Self {
        Self::Number(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// One earlier exchange replayed to the oracle ahead of the live request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorTurn {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub request_id: RequestId,
    pub purpose: OraclePurpose,
    pub context_fields: BTreeMap<String, ContextValue>,
    pub prior_turns: Vec<PriorTurn>,
}

impl OracleRequest {
    pub fn new(purpose: OraclePurpose) -> Self {
        Self {
            request_id: Uuid::now_v7().to_string(),
            purpose,
            context_fields: BTreeMap::new(),
            prior_turns: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.context_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_prior_turns(mut self, turns: Vec<PriorTurn>) -> Self {
        self.prior_turns = turns;
        self
    }

    pub fn field(&self, key: &str) -> Option<&ContextValue> {
        self.context_fields.get(key)
    }
}

/// Unparsed oracle output. Interpretation belongs to the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub request_id: RequestId,
    pub content: String,
}

impl RawResult {
    pub fn new(request_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPayload {
    pub messages: Vec<ChatMessage>,
    pub json_output: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRef {
    Env {
        var: String,
    },
    InlineToken {
        token: String,
    },
    #[default]
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub auth_header: Option<String>,
}

impl ResolvedCredential {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn bearer(token: &str) -> Self {
        Self {
            auth_header: Some(format!("Bearer {token}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub credential: CredentialRef,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: Option<u64>,
    #[serde(default)]
    pub few_shot_path: Option<PathBuf>,
}

impl OracleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> Option<u64> {
    Some(1_200)
}

#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub request_id: RequestId,
    pub endpoint: String,
    pub model: String,
    pub credential: ResolvedCredential,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_output_tokens: Option<u64>,
}
