use serde::Serialize;

use crate::{
    orchestrator::escalation::EmergencyPayload,
    router::RiskTier,
    session::SessionRecord,
    types::{
        ActionStep, EscalationDecision, EscalationEntry, GuidanceStep, RecheckSummary, SessionId,
        SeverityLevel, StepId,
    },
};

const DEGRADED_CRISIS_TYPE: &str = "Error";
const DEGRADED_REASSURANCE: &str =
    "Please provide information about a medical situation for assistance.";

/// What the caller gets back from every run. Failures inside the pipeline never
/// escape as errors; they surface as `Emergency` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Resolved(GuidanceSummary),
    NeedsSupport(GuidanceSummary),
    Emergency(EmergencyPayload),
    Assessed(CrisisReport),
    Error(CrisisReport),
}

impl PipelineOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Resolved(_) => "resolved",
            Self::NeedsSupport(_) => "needs_support",
            Self::Emergency(_) => "emergency",
            Self::Assessed(_) => "assessed",
            Self::Error(_) => "error",
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(self, Self::Emergency(_))
    }

    pub fn report(&self) -> Option<&CrisisReport> {
        match self {
            Self::Assessed(report) | Self::Error(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidanceSummary {
    pub session_id: SessionId,
    pub steps_taken: u32,
    pub steps: Vec<GuidanceStep>,
    pub message: String,
}

/// Caller-facing projection of a session after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrisisReport {
    pub session_id: SessionId,
    pub user_prompt: String,
    pub crisis_type: String,
    pub severity_level: SeverityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_severity: Option<SeverityLevel>,
    pub assessment: String,
    pub immediate_actions: Vec<ActionStep>,
    pub do_not_do: Vec<String>,
    pub escalation: EscalationDecision,
    pub escalation_history: Vec<EscalationEntry>,
    pub completed_steps: Vec<StepId>,
    pub reassurance_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptom_recheck: Option<RecheckSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_tier: Option<RiskTier>,
}

impl CrisisReport {
    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            user_prompt: record.user_prompt.clone(),
            crisis_type: record.crisis_type.clone().unwrap_or_default(),
            severity_level: record.severity_level,
            previous_severity: record.previous_severity,
            assessment: record.assessment.clone().unwrap_or_default(),
            immediate_actions: record.current_plan.clone(),
            do_not_do: record.do_not_do.clone(),
            escalation: EscalationDecision {
                required: record.escalation_required,
                ..record.escalation.clone()
            },
            escalation_history: record.escalation_history.clone(),
            completed_steps: record.completed_steps.iter().copied().collect(),
            reassurance_message: record.reassurance_message.clone().unwrap_or_default(),
            symptom_recheck: record.symptom_recheck.clone(),
            risk_tier: record.risk_tier,
        }
    }

    /// Valid report shape for input the pipeline refused. Severity, escalation and the
    /// plan still reflect the session, so a fresh session reports no actions at all.
    pub fn degraded(record: &SessionRecord, message: impl Into<String>) -> Self {
        let escalation = if record.escalation_required {
            EscalationDecision {
                required: true,
                ..record.escalation.clone()
            }
        } else {
            EscalationDecision::new(false, Vec::new(), "Not applicable")
        };

        Self {
            crisis_type: DEGRADED_CRISIS_TYPE.to_string(),
            assessment: message.into(),
            do_not_do: vec!["Do not provide non-medical queries".to_string()],
            escalation,
            reassurance_message: DEGRADED_REASSURANCE.to_string(),
            symptom_recheck: None,
            ..Self::from_record(record)
        }
    }
}
