use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    oracle::{OracleError, OracleErrorKind},
    router::RiskTier,
    types::{
        ActionStep, EscalationDecision, EscalationEntry, GuidanceStep, RecheckSummary, SessionId,
        SeverityLevel, StepId,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum StageErrorKind {
    Oracle(OracleErrorKind),
    RejectedInput,
}

/// Error recorded by a stage. Its presence makes the remaining stages of the run skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageError {
    pub stage: &'static str,
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageError {
    pub fn oracle(stage: &'static str, err: &OracleError) -> Self {
        Self {
            stage,
            kind: StageErrorKind::Oracle(err.kind),
            message: err.to_string(),
        }
    }

    pub fn rejected_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: StageErrorKind::RejectedInput,
            message: message.into(),
        }
    }

    pub fn is_oracle_failure(&self) -> bool {
        matches!(self.kind, StageErrorKind::Oracle(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub user_prompt: String,
    pub normalized_input: Option<String>,
    pub crisis_type: Option<String>,
    pub assessment: Option<String>,
    pub severity_level: SeverityLevel,
    pub previous_severity: Option<SeverityLevel>,
    pub escalation_required: bool,
    pub escalation: EscalationDecision,
    pub escalation_history: Vec<EscalationEntry>,
    pub completed_steps: BTreeSet<StepId>,
    pub current_plan: Vec<ActionStep>,
    pub do_not_do: Vec<String>,
    pub reassurance_message: Option<String>,
    pub symptom_recheck: Option<RecheckSummary>,
    pub guidance: Vec<GuidanceStep>,
    pub risk_tier: Option<RiskTier>,
    pub step_counter: u32,
    pub last_error: Option<StageError>,
    /// Whether `completed_steps` was already non-empty when the current run began.
    #[serde(skip)]
    pub completions_inherited: bool,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            user_prompt: String::new(),
            normalized_input: None,
            crisis_type: None,
            assessment: None,
            severity_level: SeverityLevel::Low,
            previous_severity: None,
            escalation_required: false,
            escalation: EscalationDecision::default(),
            escalation_history: Vec::new(),
            completed_steps: BTreeSet::new(),
            current_plan: Vec::new(),
            do_not_do: Vec::new(),
            reassurance_message: None,
            symptom_recheck: None,
            guidance: Vec::new(),
            risk_tier: None,
            step_counter: 0,
            last_error: None,
            completions_inherited: false,
        }
    }

    /// Resets the run-scoped fields. Everything else carries over from earlier runs.
    pub fn begin_run(&mut self) {
        self.step_counter = 0;
        self.last_error = None;
        self.completions_inherited = !self.completed_steps.is_empty();
    }

    pub fn advance_step(&mut self) -> u32 {
        self.step_counter += 1;
        self.step_counter
    }

    /// True once any earlier run left something behind in this session.
    pub fn has_history(&self) -> bool {
        self.is_assessed()
            || self.crisis_type.is_some()
            || !self.escalation_history.is_empty()
            || !self.guidance.is_empty()
    }

    pub fn is_assessed(&self) -> bool {
        !self.current_plan.is_empty()
    }

    pub fn plan_step_ids(&self) -> BTreeSet<StepId> {
        self.current_plan.iter().map(|step| step.step_id).collect()
    }

    /// Raises severity to at least `floor`. Lowering goes through `previous_severity`
    /// and reconcile.
    pub fn raise_severity(&mut self, floor: SeverityLevel) {
        self.severity_level = self.severity_level.max(floor);
    }

    /// Makes `decision` current and appends it to the history.
    pub fn record_escalation(&mut self, decision: EscalationDecision) {
        self.escalation_history.push(EscalationEntry {
            required: decision.required,
            contacts: decision.contacts.clone(),
            reason: decision.reason.clone(),
            severity_at_time: self.severity_level,
        });
        self.escalation_required = decision.required;
        self.escalation = decision;
    }
}
