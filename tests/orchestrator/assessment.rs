use std::{sync::Arc, time::Duration};

use lifeline::{
    oracle::{OracleErrorKind, OraclePurpose, OracleRequest},
    orchestrator::{
        CrisisRequest, LifecycleEvent, Orchestrator, PipelineOutcome, SafetyActionKind,
        escalation::MEDICAL_EMERGENCY_MESSAGE,
    },
    router::{CrisisCategory, Mood, RiskTier},
    testing::{OracleFuture, ScriptedOracle, boxed},
    types::{ContactKind, SeverityLevel},
    validator::{
        FallbackContext,
        fallback::{fallback_plan, oracle_failure_plan},
    },
};

use crate::support::{CHEST_PAIN, harness, medical_oracle, risk};

#[tokio::test]
async fn given_chest_pain_with_panic_when_assessed_then_full_pipeline_yields_critical_plan() {
    let h = harness(medical_oracle("critical", 4));
    let request = CrisisRequest::new(CHEST_PAIN)
        .with_session("chest-pain")
        .with_mood(Mood::Panic)
        .with_category(CrisisCategory::Cardiac);

    let outcome = h.orchestrator.assess(request).await;
    let PipelineOutcome::Assessed(report) = outcome else {
        panic!("expected assessed outcome, got {outcome:?}");
    };

    assert_eq!(report.risk_tier, Some(RiskTier::High));
    assert_eq!(report.severity_level, SeverityLevel::Critical);
    assert_eq!(report.immediate_actions.len(), 4);
    assert!(report.immediate_actions.iter().any(|step| step.critical));
    assert!(report.escalation.required);
    assert!(report.escalation.contacts.contains(&ContactKind::Ambulance));
    assert_eq!(report.escalation_history.len(), 1);
    assert_eq!(
        h.oracle.purposes(),
        vec![
            OraclePurpose::Normalize,
            OraclePurpose::Classify,
            OraclePurpose::AssessRisk,
            OraclePurpose::PlanActions,
        ]
    );

    let counters = h
        .lifecycle
        .events()
        .into_iter()
        .filter_map(|event| match event {
            LifecycleEvent::StageCompleted { step_counter, .. } => Some(step_counter),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(counters, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn given_high_severity_without_medical_contact_then_nearby_hospital_is_put_first() {
    let oracle = medical_oracle("high", 3).respond(OraclePurpose::AssessRisk, risk(false, &["friend"]));
    let h = harness(oracle);

    let outcome = h.orchestrator.assess(CrisisRequest::new(CHEST_PAIN)).await;
    let report = outcome.report().expect("assessed outcome has a report");

    assert!(report.escalation.required);
    assert_eq!(
        report.escalation.contacts,
        vec![ContactKind::NearbyHospital, ContactKind::Friend]
    );
}

#[tokio::test]
async fn given_kill_myself_when_assessed_then_emergency_without_any_oracle_call() {
    let h = harness(medical_oracle("low", 3));

    let outcome = h
        .orchestrator
        .assess(
            CrisisRequest::new("I can't do this anymore, I want to kill myself")
                .with_session("extreme")
                .with_mood(Mood::Calm)
                .with_category(CrisisCategory::Fever),
        )
        .await;

    let PipelineOutcome::Emergency(payload) = outcome else {
        panic!("expected emergency, got {outcome:?}");
    };
    assert_eq!(h.oracle.call_count(), 0);
    assert_eq!(payload.actions[0].kind, SafetyActionKind::Call);
    assert_eq!(payload.actions[0].value.as_deref(), Some("14416"));

    let record = h
        .orchestrator
        .store()
        .snapshot("extreme")
        .await
        .expect("session exists");
    assert_eq!(record.severity_level, SeverityLevel::Critical);
    assert!(record.escalation_required);
    assert_eq!(record.escalation_history.len(), 1);
    assert!(
        h.lifecycle
            .events()
            .iter()
            .any(|event| matches!(event, LifecycleEvent::ShortCircuited { .. }))
    );
}

#[tokio::test]
async fn given_unreachable_oracle_when_assessed_then_emergency_after_a_single_call() {
    let h = harness(ScriptedOracle::new().fail_everything(OracleErrorKind::Timeout));

    let outcome = h
        .orchestrator
        .assess(CrisisRequest::new(CHEST_PAIN).with_session("down"))
        .await;

    let PipelineOutcome::Emergency(payload) = outcome else {
        panic!("expected emergency, got {outcome:?}");
    };
    assert_eq!(payload.message, MEDICAL_EMERGENCY_MESSAGE);
    assert_eq!(payload.actions[0].value.as_deref(), Some("112"));
    assert_eq!(h.oracle.call_count(), 1, "no retry and no later stages");

    let record = h
        .orchestrator
        .store()
        .snapshot("down")
        .await
        .expect("session exists");
    assert!(record.escalation_required);
    assert_eq!(record.escalation_history.len(), 1);
    assert_eq!(record.escalation.contacts[0], ContactKind::Ambulance);

    let events = h.lifecycle.events();
    assert!(events.iter().any(|event| matches!(
        event,
        LifecycleEvent::StageFailed {
            stage: "normalizing",
            ..
        }
    )));
    assert!(matches!(
        events.last(),
        Some(LifecycleEvent::RunCompleted {
            status: "emergency",
            ..
        })
    ));
}

#[tokio::test]
async fn given_planning_failure_when_assessed_then_emergency_keeps_safe_plan_and_single_entry() {
    let oracle = medical_oracle("critical", 3).fail(OraclePurpose::PlanActions, OracleErrorKind::Unreachable);
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .assess(CrisisRequest::new(CHEST_PAIN).with_session("plan-down"))
        .await;
    assert!(outcome.is_emergency());

    let record = h
        .orchestrator
        .store()
        .snapshot("plan-down")
        .await
        .expect("session exists");
    assert_eq!(record.current_plan, oracle_failure_plan());
    assert_eq!(record.escalation_history.len(), 1);
    assert!(record.escalation_required);
}

#[tokio::test]
async fn given_non_medical_text_when_assessed_then_error_report_is_returned() {
    let oracle = ScriptedOracle::new().respond(OraclePurpose::Normalize, "NON_MEDICAL_INPUT");
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .assess(CrisisRequest::new("What is the capital of France?"))
        .await;

    let PipelineOutcome::Error(report) = outcome else {
        panic!("expected error outcome, got {outcome:?}");
    };
    assert_eq!(report.crisis_type, "Error");
    assert!(report.immediate_actions.is_empty(), "a fresh session has no plan to report");
    assert!(!report.escalation.required);
    assert_eq!(h.oracle.call_count(), 1);
}

#[tokio::test]
async fn given_garbage_from_every_stage_when_assessed_then_defaults_fill_a_valid_report() {
    let oracle = ScriptedOracle::new()
        .respond(OraclePurpose::Normalize, "headache and dizziness")
        .respond(OraclePurpose::Classify, "no idea")
        .respond(OraclePurpose::AssessRisk, "[]")
        .respond(OraclePurpose::PlanActions, "{\"immediate_actions\": \"call someone\"}");
    let h = harness(oracle);

    let outcome = h.orchestrator.assess(CrisisRequest::new("headache and dizzy")).await;
    let PipelineOutcome::Assessed(report) = outcome else {
        panic!("expected assessed outcome, got {outcome:?}");
    };

    assert_eq!(report.severity_level, SeverityLevel::Moderate);
    assert_eq!(report.crisis_type, "Unknown medical issue");
    assert!(!report.escalation.required);
    assert_eq!(report.escalation.contacts, vec![ContactKind::Relative]);
    assert_eq!(
        report.immediate_actions,
        fallback_plan(FallbackContext::StableOrInitial)
    );
}

#[tokio::test]
async fn given_second_assessment_reporting_lower_severity_then_severity_does_not_drop() {
    let h = harness(medical_oracle("critical", 3));
    h.orchestrator
        .assess(CrisisRequest::new(CHEST_PAIN).with_session("repeat"))
        .await;

    let calmer = harness(medical_oracle("low", 3));
    // Same store, calmer oracle.
    let orchestrator = lifeline::orchestrator::Orchestrator::new(
        calmer.oracle.clone(),
        Arc::clone(h.orchestrator.store()),
        *h.orchestrator.limits(),
    );
    let outcome = orchestrator
        .assess(CrisisRequest::new("he says he feels a bit better").with_session("repeat"))
        .await;

    let report = outcome.report().expect("assessed outcome has a report");
    assert_eq!(report.severity_level, SeverityLevel::Critical);
    assert_eq!(report.previous_severity, Some(SeverityLevel::Critical));
    assert!(report.escalation.required);
    assert_eq!(report.escalation_history.len(), 2);
}

#[tokio::test]
async fn given_cancelled_run_then_committed_history_stays_and_session_is_released() {
    let oracle = medical_oracle("critical", 3).hook(
        OraclePurpose::PlanActions,
        Arc::new(|_request: OracleRequest| -> OracleFuture { boxed(std::future::pending()) }),
    );
    let h = harness(oracle);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        h.orchestrator
            .assess(CrisisRequest::new(CHEST_PAIN).with_session("cancelled")),
    )
    .await;
    assert!(cancelled.is_err(), "planning never answers");

    let record = tokio::time::timeout(
        Duration::from_secs(1),
        h.orchestrator.store().snapshot("cancelled"),
    )
    .await
    .expect("lease is released on cancellation")
    .expect("session exists");
    assert_eq!(record.escalation_history.len(), 1);
    assert!(record.escalation_required);
    assert_eq!(record.severity_level, SeverityLevel::Critical);
    assert_eq!(record.crisis_type.as_deref(), Some("Cardiac emergency"));
}

#[tokio::test]
async fn given_non_medical_follow_up_on_assessed_session_then_error_report_keeps_the_plan() {
    let h = harness(medical_oracle("high", 4));
    h.orchestrator
        .assess(CrisisRequest::new(CHEST_PAIN).with_session("off-topic"))
        .await;

    let off_topic = Orchestrator::new(
        Arc::new(ScriptedOracle::new().respond(OraclePurpose::Normalize, "NON_MEDICAL_INPUT")),
        Arc::clone(h.orchestrator.store()),
        *h.orchestrator.limits(),
    );
    let outcome = off_topic
        .assess(CrisisRequest::new("What is the capital of France?").with_session("off-topic"))
        .await;

    let PipelineOutcome::Error(report) = outcome else {
        panic!("expected error outcome, got {outcome:?}");
    };
    assert_eq!(report.immediate_actions.len(), 4);
    assert!((3..=7).contains(&report.immediate_actions.len()));
    assert_eq!(report.severity_level, SeverityLevel::High);
    assert!(report.escalation.required);
}

#[tokio::test]
async fn given_earlier_escalation_when_oracle_fails_on_next_assessment_then_failure_is_recorded() {
    let h = harness(medical_oracle("critical", 3));
    h.orchestrator
        .assess(CrisisRequest::new(CHEST_PAIN).with_session("down-later"))
        .await;

    let unreachable = Orchestrator::new(
        Arc::new(ScriptedOracle::new().fail_everything(OracleErrorKind::Timeout)),
        Arc::clone(h.orchestrator.store()),
        *h.orchestrator.limits(),
    );
    let outcome = unreachable
        .assess(CrisisRequest::new("he is getting worse").with_session("down-later"))
        .await;
    assert!(outcome.is_emergency(), "got {outcome:?}");

    let record = h
        .orchestrator
        .store()
        .snapshot("down-later")
        .await
        .expect("session exists");
    assert_eq!(record.escalation_history.len(), 2);
    assert!(record.escalation_history.iter().all(|entry| entry.required));
    assert_eq!(record.last_error.map(|error| error.stage), Some("normalizing"));
}

#[tokio::test]
async fn given_calm_risk_then_planning_failure_records_its_own_required_escalation() {
    let oracle = medical_oracle("low", 3)
        .respond(OraclePurpose::AssessRisk, risk(false, &["relative"]))
        .fail(OraclePurpose::PlanActions, OracleErrorKind::Unreachable);
    let h = harness(oracle);

    let outcome = h
        .orchestrator
        .assess(CrisisRequest::new(CHEST_PAIN).with_session("calm-then-down"))
        .await;
    assert!(outcome.is_emergency(), "got {outcome:?}");

    let record = h
        .orchestrator
        .store()
        .snapshot("calm-then-down")
        .await
        .expect("session exists");
    assert_eq!(record.escalation_history.len(), 2);
    assert!(!record.escalation_history[0].required);
    assert!(record.escalation_history[1].required);
    assert!(record.escalation_required);
}
