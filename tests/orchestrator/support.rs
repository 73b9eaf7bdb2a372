use std::sync::Arc;

use serde_json::{Value, json};

use lifeline::{
    oracle::OraclePurpose,
    orchestrator::{Orchestrator, OrchestratorLimits},
    session::SessionStore,
    testing::{RecordingLifecycleSink, ScriptedOracle},
};

pub const CHEST_PAIN: &str = "My father is having chest pain and sweating heavily";

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub oracle: Arc<ScriptedOracle>,
    pub lifecycle: Arc<RecordingLifecycleSink>,
}

pub fn harness(oracle: ScriptedOracle) -> Harness {
    let oracle = Arc::new(oracle);
    let lifecycle = Arc::new(RecordingLifecycleSink::default());
    let orchestrator = Orchestrator::new(
        oracle.clone(),
        Arc::new(SessionStore::new()),
        OrchestratorLimits::default(),
    )
    .with_lifecycle_sink(lifecycle.clone());
    Harness {
        orchestrator,
        oracle,
        lifecycle,
    }
}

pub fn classification(severity: &str) -> String {
    json!({
        "crisis_type": "Cardiac emergency",
        "severity_level": severity,
        "assessment": "Possible heart attack. Stay calm and act quickly."
    })
    .to_string()
}

pub fn risk(required: bool, contacts: &[&str]) -> String {
    json!({
        "escalation_required": required,
        "who_to_contact": contacts,
        "reason": "Chest pain with heavy sweating"
    })
    .to_string()
}

pub fn step(title: &str, critical: bool) -> Value {
    json!({
        "step_id": 1,
        "title": title,
        "instruction": format!("{title}."),
        "duration_seconds": null,
        "user_confirmation_required": true,
        "critical": critical,
        "repeatable": false
    })
}

pub fn plan(count: usize) -> String {
    let steps = (0..count)
        .map(|index| step(&format!("Action {}", index + 1), index == 0))
        .collect::<Vec<_>>();
    json!({
        "immediate_actions": steps,
        "do_not_do": ["Do not let him walk around"],
        "reassurance_message": "You are doing the right thing."
    })
    .to_string()
}

pub fn recheck_answer(required: bool, steps: usize) -> String {
    let steps = (0..steps)
        .map(|index| step(&format!("Recheck action {}", index + 1), index == 0))
        .collect::<Vec<_>>();
    json!({
        "assessment": "Symptoms reviewed",
        "immediate_actions": steps,
        "escalation_required": required,
        "who_to_contact": ["relative"],
        "escalation_reason": "Re-evaluated",
        "reassurance_message": "Keep monitoring."
    })
    .to_string()
}

pub fn guidance(step: u32, actionable: bool, resolved: bool) -> String {
    json!({
        "step": step,
        "instruction": format!("Guidance {step}"),
        "timer_seconds": 30,
        "actionable": actionable,
        "resolved": resolved
    })
    .to_string()
}

/// Oracle scripted for a full medical assessment at `severity`.
pub fn medical_oracle(severity: &str, plan_steps: usize) -> ScriptedOracle {
    ScriptedOracle::new()
        .respond(
            OraclePurpose::Normalize,
            "Father has chest pain with heavy sweating.",
        )
        .respond(OraclePurpose::Classify, classification(severity))
        .respond(OraclePurpose::AssessRisk, risk(true, &["relative", "ambulance"]))
        .respond(OraclePurpose::PlanActions, plan(plan_steps))
}
