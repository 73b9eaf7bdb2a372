use lifeline::{
    oracle::{OracleErrorKind, OraclePurpose},
    orchestrator::{
        CrisisRequest, PipelineOutcome, SafetyActionKind,
        escalation::{FINANCIAL_EMERGENCY_MESSAGE, SELF_HARM_MESSAGE},
    },
    router::{CrisisCategory, Mood, RiskTier},
    testing::ScriptedOracle,
    types::ContactKind,
};

use crate::support::{guidance, harness};

const HACKED: &str = "Someone hacked my bank account and moved money out";

fn fraud_request(session_id: &str, mood: Mood) -> CrisisRequest {
    CrisisRequest::new(HACKED)
        .with_session(session_id)
        .with_mood(mood)
        .with_category(CrisisCategory::FraudShock)
}

fn steps(count: u32, actionable: bool) -> Vec<String> {
    (1..=count)
        .map(|step| guidance(step, actionable, false))
        .collect()
}

#[tokio::test]
async fn given_problem_resolved_on_second_step_then_guidance_stops_there() {
    let oracle = ScriptedOracle::new().respond_in_order(
        OraclePurpose::GuideStep,
        vec![guidance(1, true, false), guidance(2, true, true)],
    );
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .guide(fraud_request("resolved", Mood::Neutral))
        .await;
    let PipelineOutcome::Resolved(summary) = outcome else {
        panic!("expected resolved, got {outcome:?}");
    };

    assert_eq!(summary.steps_taken, 2);
    assert_eq!(summary.message, "Guidance 2");
    assert_eq!(summary.steps.len(), 2);
    assert_eq!(h.oracle.call_count(), 2);

    let requests = h.oracle.requests();
    assert_eq!(
        requests[0]
            .field("previous_instructions")
            .map(ToString::to_string)
            .as_deref(),
        Some("none")
    );
    let previous = requests[1]
        .field("previous_instructions")
        .map(ToString::to_string)
        .unwrap_or_default();
    assert!(previous.contains("1. Guidance 1"), "got {previous}");

    let record = h
        .orchestrator
        .store()
        .snapshot("resolved")
        .await
        .expect("session exists");
    assert_eq!(record.risk_tier, Some(RiskTier::Medium));
    assert!(!record.escalation_required);
}

#[tokio::test]
async fn given_panicking_user_then_high_tier_budget_ends_in_needs_support() {
    let oracle = ScriptedOracle::new().respond_in_order(OraclePurpose::GuideStep, steps(3, true));
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .guide(fraud_request("panic", Mood::Panic))
        .await;
    let PipelineOutcome::NeedsSupport(summary) = outcome else {
        panic!("expected needs support, got {outcome:?}");
    };

    assert_eq!(summary.steps_taken, 3);
    assert_eq!(summary.message, "External support recommended");
    assert_eq!(h.oracle.call_count(), 3);
}

#[tokio::test]
async fn given_user_unable_to_act_past_optimal_steps_then_financial_emergency() {
    let oracle = ScriptedOracle::new().respond_in_order(OraclePurpose::GuideStep, steps(7, false));
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .guide(fraud_request("stuck", Mood::Neutral))
        .await;
    let PipelineOutcome::Emergency(payload) = outcome else {
        panic!("expected emergency, got {outcome:?}");
    };

    assert_eq!(h.oracle.call_count(), 4, "no emergency before the optimal step");
    assert_eq!(payload.reason, "User unable to proceed");
    assert_eq!(payload.message, FINANCIAL_EMERGENCY_MESSAGE);
    assert!(payload.actions.iter().any(|action| {
        action.kind == SafetyActionKind::Call && action.value.as_deref() == Some("1930")
    }));

    let record = h
        .orchestrator
        .store()
        .snapshot("stuck")
        .await
        .expect("session exists");
    assert!(record.escalation_required);
    assert_eq!(
        record.escalation.contacts,
        vec![ContactKind::Relative, ContactKind::Friend]
    );
    assert_eq!(record.escalation_history.len(), 1);
    assert_eq!(record.guidance.len(), 4);
}

#[tokio::test]
async fn given_unresolved_guidance_then_step_budget_exhaustion_is_an_emergency() {
    let oracle = ScriptedOracle::new().respond_in_order(OraclePurpose::GuideStep, steps(7, true));
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .guide(fraud_request("budget", Mood::Neutral))
        .await;
    let PipelineOutcome::Emergency(payload) = outcome else {
        panic!("expected emergency, got {outcome:?}");
    };

    assert_eq!(payload.reason, "Step budget exhausted after 7 steps");
    assert_eq!(h.oracle.call_count(), 7);
}

#[tokio::test]
async fn given_oracle_timeout_during_guidance_then_emergency_after_one_call() {
    let oracle = ScriptedOracle::new().fail(OraclePurpose::GuideStep, OracleErrorKind::Timeout);
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .guide(fraud_request("guide-down", Mood::Stress))
        .await;
    let PipelineOutcome::Emergency(payload) = outcome else {
        panic!("expected emergency, got {outcome:?}");
    };

    assert_eq!(h.oracle.call_count(), 1);
    assert_eq!(payload.message, FINANCIAL_EMERGENCY_MESSAGE);
    assert!(payload.reason.contains("guidance"));

    let record = h
        .orchestrator
        .store()
        .snapshot("guide-down")
        .await
        .expect("session exists");
    assert!(record.escalation_required);
    assert!(record.guidance.is_empty());
}

#[tokio::test]
async fn given_self_harm_text_then_guidance_never_calls_the_oracle() {
    let oracle = ScriptedOracle::new().respond_in_order(OraclePurpose::GuideStep, steps(1, true));
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .guide(
            CrisisRequest::new("I lost everything in crypto and I want to end my life")
                .with_session("guide-extreme"),
        )
        .await;
    let PipelineOutcome::Emergency(payload) = outcome else {
        panic!("expected emergency, got {outcome:?}");
    };

    assert_eq!(payload.message, SELF_HARM_MESSAGE);
    assert_eq!(h.oracle.call_count(), 0);
}
