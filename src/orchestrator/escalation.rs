use serde::Serialize;

use crate::{
    orchestrator::types::OrchestratorLimits,
    router::CrisisDomain,
    types::{ContactKind, EscalationDecision, GuidanceStep},
};

pub const SELF_HARM_MESSAGE: &str = "You are not alone. Please contact a trusted person, family member, or a crisis helpline immediately.";
pub const FINANCIAL_EMERGENCY_MESSAGE: &str = "Immediate external support recommended.";
pub const MEDICAL_EMERGENCY_MESSAGE: &str = "Please call emergency services now. Immediate medical support is recommended.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmergencyReason {
    SelfHarmRisk,
    OracleFailure {
        domain: CrisisDomain,
        stage: &'static str,
        detail: String,
    },
    StepBudgetExhausted {
        domain: CrisisDomain,
        steps: u32,
    },
    UserUnableToProceed {
        domain: CrisisDomain,
        steps: u32,
    },
}

impl EmergencyReason {
    pub fn domain(&self) -> Option<CrisisDomain> {
        match self {
            Self::SelfHarmRisk => None,
            Self::OracleFailure { domain, .. }
            | Self::StepBudgetExhausted { domain, .. }
            | Self::UserUnableToProceed { domain, .. } => Some(*domain),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::SelfHarmRisk => "Self-harm risk detected".to_string(),
            Self::OracleFailure { stage, detail, .. } => {
                format!("Guidance unavailable during {stage}: {detail}")
            }
            Self::StepBudgetExhausted { steps, .. } => {
                format!("Step budget exhausted after {steps} steps")
            }
            Self::UserUnableToProceed { .. } => "User unable to proceed".to_string(),
        }
    }

    /// Contacts recorded in the session when this emergency is raised.
    pub fn contacts(&self) -> Vec<ContactKind> {
        match self.domain() {
            None | Some(CrisisDomain::Financial) => {
                vec![ContactKind::Relative, ContactKind::Friend]
            }
            Some(CrisisDomain::Medical) => vec![ContactKind::Ambulance, ContactKind::Relative],
        }
    }

    pub fn escalation(&self) -> EscalationDecision {
        EscalationDecision::new(true, self.contacts(), self.describe())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyActionKind {
    Call,
    Step,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyAction {
    pub kind: SafetyActionKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SafetyAction {
    fn call(label: &str, number: &str) -> Self {
        Self {
            kind: SafetyActionKind::Call,
            label: label.to_string(),
            value: Some(number.to_string()),
        }
    }

    fn step(label: &str) -> Self {
        Self {
            kind: SafetyActionKind::Step,
            label: label.to_string(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergencyPayload {
    pub reason: String,
    pub message: String,
    pub actions: Vec<SafetyAction>,
}

/// Fixed safety payload for `reason`. Deterministic, never consults the oracle.
pub fn build(reason: &EmergencyReason) -> EmergencyPayload {
    let (message, actions) = match reason.domain() {
        None => (
            SELF_HARM_MESSAGE,
            vec![
                SafetyAction::call("Mental health helpline", "14416"),
                SafetyAction::step("Reach a trusted person now"),
                SafetyAction::step("Move away from anything you could use to hurt yourself"),
                SafetyAction::call("Emergency services", "112"),
            ],
        ),
        Some(CrisisDomain::Financial) => (
            FINANCIAL_EMERGENCY_MESSAGE,
            vec![
                SafetyAction::step("Stop financial transactions"),
                SafetyAction::step("Contact your bank"),
                SafetyAction::call("Cybercrime helpline", "1930"),
                SafetyAction::step("Reach a trusted person"),
            ],
        ),
        Some(CrisisDomain::Medical) => (
            MEDICAL_EMERGENCY_MESSAGE,
            vec![
                SafetyAction::call("Emergency services", "112"),
                SafetyAction::step("Stay with the person and keep them still"),
                SafetyAction::step("Reach a trusted person nearby"),
            ],
        ),
    };

    EmergencyPayload {
        reason: reason.describe(),
        message: message.to_string(),
        actions,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reevaluation {
    pub problem_resolved: bool,
    pub can_user_take_next_action: bool,
}

/// Looks at the latest guidance step only.
pub fn reevaluate(history: &[GuidanceStep]) -> Reevaluation {
    match history.last() {
        Some(last) => Reevaluation {
            problem_resolved: last.resolved,
            can_user_take_next_action: last.actionable,
        },
        None => Reevaluation {
            problem_resolved: false,
            can_user_take_next_action: true,
        },
    }
}

/// Emergency when the step budget is spent, or when past the optimal step count the
/// user can no longer act on their own.
pub fn check_emergency(
    step: u32,
    reevaluation: &Reevaluation,
    limits: &OrchestratorLimits,
    domain: CrisisDomain,
) -> Option<EmergencyReason> {
    if step >= limits.max_steps {
        Some(EmergencyReason::StepBudgetExhausted {
            domain,
            steps: step,
        })
    } else if step >= limits.optimal_steps && !reevaluation.can_user_take_next_action {
        Some(EmergencyReason::UserUnableToProceed {
            domain,
            steps: step,
        })
    } else {
        None
    }
}
