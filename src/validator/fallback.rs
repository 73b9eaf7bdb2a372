use serde::{Deserialize, Serialize};

use crate::types::{ActionStep, SeverityLevel};

/// Which fixed plan replaces an oracle plan that cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackContext {
    Worsened,
    Unsure,
    StableOrInitial,
}

pub const DEFAULT_DO_NOT_DO: [&str; 2] = [
    "Do not panic or make rushed decisions",
    "Do not give any medication without medical guidance",
];

pub const DEFAULT_REASSURANCE: &str = "You're taking the right steps by seeking guidance. Stay calm and follow the actions carefully.";

pub const STABLE_REASSURANCE: &str = "Continue monitoring the situation carefully.";
pub const URGENT_REASSURANCE: &str = "Medical attention is now more urgently needed.";

pub const ORACLE_FAILURE_DO_NOT_DO: [&str; 1] = ["Do not delay seeking professional help"];
pub const ORACLE_FAILURE_REASSURANCE: &str = "Please seek immediate medical attention.";

fn step(
    step_id: u32,
    title: &str,
    instruction: &str,
    duration_seconds: Option<u32>,
    user_confirmation_required: bool,
    critical: bool,
    repeatable: bool,
) -> ActionStep {
    ActionStep {
        step_id,
        title: title.to_string(),
        instruction: instruction.to_string(),
        duration_seconds,
        user_confirmation_required,
        critical,
        repeatable,
    }
}

pub fn fallback_plan(context: FallbackContext) -> Vec<ActionStep> {
    match context {
        FallbackContext::Worsened => vec![
            step(
                1,
                "Call emergency services",
                "Call emergency services immediately. The condition has worsened and requires urgent medical evaluation.",
                None,
                false,
                true,
                false,
            ),
            step(
                2,
                "Monitor vital signs",
                "Continue monitoring breathing, consciousness, and any changes in symptoms until help arrives.",
                Some(60),
                true,
                true,
                true,
            ),
            step(
                3,
                "Stay with patient",
                "Do not leave the patient alone. Be prepared to provide information to emergency responders.",
                None,
                true,
                true,
                false,
            ),
        ],
        FallbackContext::Unsure => vec![
            step(
                1,
                "Check vital signs",
                "Check breathing rate, pulse, and level of consciousness carefully.",
                Some(30),
                true,
                false,
                true,
            ),
            step(
                2,
                "Contact medical advice",
                "Call a medical helpline or your doctor for professional guidance on next steps.",
                None,
                true,
                false,
                false,
            ),
            step(
                3,
                "Continue monitoring",
                "Keep watching for any changes and be ready to call emergency services if condition worsens.",
                Some(120),
                true,
                false,
                true,
            ),
        ],
        FallbackContext::StableOrInitial => vec![
            step(
                1,
                "Ensure safety",
                "Make sure the environment is safe for both you and the patient.",
                None,
                true,
                false,
                false,
            ),
            step(
                2,
                "Call for help",
                "Call emergency services immediately and describe the situation.",
                None,
                false,
                true,
                false,
            ),
            step(
                3,
                "Monitor patient",
                "Stay with the patient and monitor their breathing and consciousness.",
                Some(60),
                true,
                true,
                true,
            ),
        ],
    }
}

/// The fallback for `context`, upgraded to the worsened plan when it would leave a
/// high or critical situation without a critical step.
pub fn fallback_plan_for(context: FallbackContext, severity: SeverityLevel) -> Vec<ActionStep> {
    let plan = fallback_plan(context);
    if severity.requires_critical_step() && !plan.iter().any(|step| step.critical) {
        fallback_plan(FallbackContext::Worsened)
    } else {
        plan
    }
}

/// Plan used when the planning call itself failed.
pub fn oracle_failure_plan() -> Vec<ActionStep> {
    vec![
        step(
            1,
            "Call emergency services",
            "Call emergency services immediately and describe all symptoms.",
            None,
            false,
            true,
            false,
        ),
        step(
            2,
            "Stay with patient",
            "Do not leave the patient alone. Monitor their condition.",
            None,
            true,
            true,
            false,
        ),
        step(
            3,
            "Follow dispatcher instructions",
            "Listen carefully to emergency dispatcher and follow their guidance.",
            None,
            true,
            false,
            false,
        ),
    ]
}
