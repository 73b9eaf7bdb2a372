use std::fmt;

use serde::Serialize;

use crate::types::{ActionStep, ContactKind, EscalationDecision, SeverityLevel};

/// Outcome of validation. `Substituted` lists every field that had to be repaired.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<T> {
    Accepted(T),
    Substituted { value: T, fallbacks: Vec<Fallback> },
}

impl<T> Validated<T> {
    pub fn from_parts(value: T, fallbacks: Vec<Fallback>) -> Self {
        if fallbacks.is_empty() {
            Self::Accepted(value)
        } else {
            Self::Substituted { value, fallbacks }
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Accepted(value) | Self::Substituted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Accepted(value) | Self::Substituted { value, .. } => value,
        }
    }

    pub fn fallbacks(&self) -> &[Fallback] {
        match self {
            Self::Accepted(_) => &[],
            Self::Substituted { fallbacks, .. } => fallbacks,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    Unparseable,
    NotAMapping,
    Missing,
    WrongType,
    OutOfRange,
    PlanSizeOutOfBounds { count: usize, max: usize },
    PlanMissingCriticalStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    pub field: String,
    #[serde(flatten)]
    pub reason: FallbackReason,
}

impl Fallback {
    pub fn new(field: impl Into<String>, reason: FallbackReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub crisis_type: String,
    pub severity_level: SeverityLevel,
    pub assessment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub escalation: EscalationDecision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    pub steps: Vec<ActionStep>,
    pub do_not_do: Vec<String>,
    pub reassurance_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecheckVerdict {
    pub assessment: String,
    pub steps: Vec<ActionStep>,
    pub escalation_required: bool,
    pub contacts: Vec<ContactKind>,
    pub escalation_reason: String,
    pub reassurance_message: String,
}
