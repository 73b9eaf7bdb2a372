use std::fmt;

use serde::{Deserialize, Serialize};

pub type SessionId = String;
pub type StepId = u32;

pub const MIN_PLAN_STEPS: usize = 3;
pub const MAX_PLAN_STEPS: usize = 7;
pub const MIN_STEP_DURATION_SECONDS: u32 = 5;
pub const MAX_STEP_DURATION_SECONDS: u32 = 120;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    #[default]
    Low,
    Moderate,
    High,
    Critical,
}

impl SeverityLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" | "medium" => Some(Self::Moderate),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// One ordinal level up, saturating at `Critical`.
    pub fn escalated(self) -> Self {
        match self {
            Self::Low => Self::Moderate,
            Self::Moderate => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }

    pub fn requires_critical_step(self) -> bool {
        self >= Self::High
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactKind {
    #[serde(rename = "relative")]
    Relative,
    #[serde(rename = "friend")]
    Friend,
    #[serde(rename = "ambulance")]
    Ambulance,
    #[serde(rename = "nearby hospital")]
    NearbyHospital,
}

impl ContactKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', " ").as_str() {
            "relative" | "family" | "family member" => Some(Self::Relative),
            "friend" => Some(Self::Friend),
            "ambulance" | "emergency services" => Some(Self::Ambulance),
            "nearby hospital" | "hospital" => Some(Self::NearbyHospital),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStep {
    pub step_id: StepId,
    pub title: String,
    pub instruction: String,
    pub duration_seconds: Option<u32>,
    pub user_confirmation_required: bool,
    pub critical: bool,
    pub repeatable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub required: bool,
    #[serde(rename = "who_to_contact")]
    pub contacts: Vec<ContactKind>,
    pub reason: String,
}

impl EscalationDecision {
    pub fn new(required: bool, contacts: Vec<ContactKind>, reason: impl Into<String>) -> Self {
        let mut deduped = Vec::with_capacity(contacts.len());
        for contact in contacts {
            if !deduped.contains(&contact) {
                deduped.push(contact);
            }
        }
        Self {
            required,
            contacts: deduped,
            reason: reason.into(),
        }
    }

    /// Puts `contact` first when it is not already listed. An existing entry keeps its position.
    pub fn prioritize(&mut self, contact: ContactKind) {
        if !self.contacts.contains(&contact) {
            self.contacts.insert(0, contact);
        }
    }

    /// High and critical severity always require escalation with a medical contact up front.
    pub fn enforce_for_severity(&mut self, severity: SeverityLevel) {
        match severity {
            SeverityLevel::Critical => {
                self.required = true;
                self.prioritize(ContactKind::Ambulance);
            }
            SeverityLevel::High => {
                self.required = true;
                self.prioritize(ContactKind::NearbyHospital);
            }
            SeverityLevel::Low | SeverityLevel::Moderate => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationEntry {
    pub required: bool,
    #[serde(rename = "who_to_contact")]
    pub contacts: Vec<ContactKind>,
    pub reason: String,
    #[serde(rename = "severity")]
    pub severity_at_time: SeverityLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorsenedResponse {
    Yes,
    No,
    Unsure,
}

impl WorsenedResponse {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unsure => "unsure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecheckAction {
    Escalated,
    Reassessed,
    Continued,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecheckSummary {
    pub asked_at: String,
    #[serde(rename = "user_response")]
    pub response: WorsenedResponse,
    pub severity_before: SeverityLevel,
    pub severity_after: SeverityLevel,
    pub action_taken: RecheckAction,
}

/// One iteration of the bounded guidance loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceStep {
    pub step: u32,
    pub instruction: String,
    pub timer_seconds: u32,
    pub actionable: bool,
    pub resolved: bool,
}
