use lifeline::{
    oracle::OraclePurpose,
    orchestrator::{CrisisRequest, PipelineOutcome, escalation::MEDICAL_EMERGENCY_MESSAGE},
    types::{ContactKind, RecheckAction, SeverityLevel, WorsenedResponse},
    validator::{FallbackContext, fallback::fallback_plan_for},
};

use crate::support::{CHEST_PAIN, Harness, harness, medical_oracle, recheck_answer, risk};

async fn assessed(h: &Harness, session_id: &str) {
    let outcome = h
        .orchestrator
        .assess(CrisisRequest::new(CHEST_PAIN).with_session(session_id))
        .await;
    assert!(
        matches!(outcome, PipelineOutcome::Assessed(_)),
        "setup assessment failed: {outcome:?}"
    );
}

#[tokio::test]
async fn given_worse_symptoms_when_rechecked_then_severity_rises_and_ambulance_is_added() {
    let oracle = medical_oracle("high", 3).respond(OraclePurpose::Recheck, recheck_answer(false, 4));
    let h = harness(oracle);
    assessed(&h, "worse").await;

    let outcome = h.orchestrator.recheck("worse", WorsenedResponse::Yes).await;
    let PipelineOutcome::Assessed(report) = outcome else {
        panic!("expected assessed outcome, got {outcome:?}");
    };

    assert_eq!(report.severity_level, SeverityLevel::Critical);
    assert_eq!(report.previous_severity, Some(SeverityLevel::High));
    assert!(report.escalation.required, "a worsened answer always escalates");
    assert!(report.escalation.contacts.contains(&ContactKind::Ambulance));
    assert_eq!(report.escalation_history.len(), 2);
    assert_eq!(report.immediate_actions.len(), 4);

    let recheck = report.symptom_recheck.expect("recheck summary is stored");
    assert_eq!(recheck.action_taken, RecheckAction::Escalated);
    assert_eq!(recheck.severity_before, SeverityLevel::High);
    assert_eq!(recheck.severity_after, SeverityLevel::Critical);
}

#[tokio::test]
async fn given_stable_symptoms_when_rechecked_then_completed_steps_are_kept() {
    let oracle = medical_oracle("high", 4).respond(OraclePurpose::Recheck, recheck_answer(false, 3));
    let h = harness(oracle);
    assessed(&h, "stable").await;
    h.orchestrator
        .complete_step("stable", 2)
        .await
        .expect("step 2 is in the plan");
    h.orchestrator
        .complete_step("stable", 4)
        .await
        .expect("step 4 is in the plan");

    let outcome = h.orchestrator.recheck("stable", WorsenedResponse::No).await;
    let PipelineOutcome::Assessed(report) = outcome else {
        panic!("expected assessed outcome, got {outcome:?}");
    };

    assert_eq!(report.severity_level, SeverityLevel::High);
    assert_eq!(report.completed_steps, vec![2, 4]);
    assert_eq!(report.immediate_actions.len(), 3);
    assert!(report.escalation.required, "escalation stays sticky");
    assert_eq!(report.escalation_history.len(), 2);
    assert_eq!(
        report.symptom_recheck.map(|recheck| recheck.action_taken),
        Some(RecheckAction::Continued)
    );

    let recheck_request = h
        .oracle
        .requests()
        .into_iter()
        .find(|request| request.purpose == OraclePurpose::Recheck)
        .expect("recheck request was sent");
    assert_eq!(
        recheck_request
            .field("max_steps")
            .map(ToString::to_string)
            .as_deref(),
        Some("3")
    );
    assert_eq!(
        recheck_request
            .field("user_worsened_response")
            .map(ToString::to_string)
            .as_deref(),
        Some("no")
    );
}

#[tokio::test]
async fn given_recheck_oracle_down_when_unsure_then_emergency_with_single_history_entry() {
    // Recheck stays unscripted, so that call fails as unreachable.
    let oracle = medical_oracle("high", 3).respond(OraclePurpose::AssessRisk, risk(true, &["relative"]));
    let h = harness(oracle);
    assessed(&h, "recheck-down").await;

    let outcome = h
        .orchestrator
        .recheck("recheck-down", WorsenedResponse::Unsure)
        .await;
    let PipelineOutcome::Emergency(payload) = outcome else {
        panic!("expected emergency, got {outcome:?}");
    };
    assert_eq!(payload.message, MEDICAL_EMERGENCY_MESSAGE);

    let record = h
        .orchestrator
        .store()
        .snapshot("recheck-down")
        .await
        .expect("session exists");
    assert_eq!(record.escalation_history.len(), 2);
    assert!(record.escalation_required);
    assert_eq!(record.escalation.contacts[0], ContactKind::Ambulance);
    assert_eq!(
        record.current_plan,
        fallback_plan_for(FallbackContext::Unsure, SeverityLevel::High)
    );
    assert_eq!(record.last_error.map(|error| error.stage), Some("recheck"));
}

#[tokio::test]
async fn given_unknown_session_when_rechecked_then_error_without_oracle_call() {
    let h = harness(medical_oracle("high", 3));

    let outcome = h.orchestrator.recheck("ghost", WorsenedResponse::Yes).await;

    let PipelineOutcome::Error(report) = outcome else {
        panic!("expected error outcome, got {outcome:?}");
    };
    assert_eq!(report.crisis_type, "Error");
    assert_eq!(h.oracle.call_count(), 0);
    assert!(h.orchestrator.store().snapshot("ghost").await.is_err());
}

#[tokio::test]
async fn given_session_without_plan_when_rechecked_then_error_and_record_untouched() {
    let h = harness(medical_oracle("high", 3));
    drop(h.orchestrator.store().open(Some("fresh".to_string())).await);

    let outcome = h.orchestrator.recheck("fresh", WorsenedResponse::Yes).await;

    assert!(matches!(outcome, PipelineOutcome::Error(_)));
    assert_eq!(h.oracle.call_count(), 0);
    let record = h
        .orchestrator
        .store()
        .snapshot("fresh")
        .await
        .expect("session exists");
    assert!(record.escalation_history.is_empty());
    assert_eq!(record.severity_level, SeverityLevel::Low);
}
