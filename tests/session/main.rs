use std::{sync::Arc, time::Duration};

use lifeline::{
    session::{InvariantCorrection, SessionErrorKind, SessionRecord, SessionStore, reconcile},
    types::{ActionStep, ContactKind, EscalationDecision, SeverityLevel},
};

fn plan(ids: &[u32]) -> Vec<ActionStep> {
    ids.iter()
        .map(|&step_id| ActionStep {
            step_id,
            title: format!("Action {step_id}"),
            instruction: "Follow medical guidance".to_string(),
            duration_seconds: None,
            user_confirmation_required: true,
            critical: step_id == 1,
            repeatable: false,
        })
        .collect()
}

fn assessed_record(id: &str) -> SessionRecord {
    let mut record = SessionRecord::new(id);
    record.severity_level = SeverityLevel::High;
    record.current_plan = plan(&[1, 2, 3]);
    record.record_escalation(EscalationDecision::new(
        true,
        vec![ContactKind::NearbyHospital],
        "chest pain",
    ));
    record
}

#[test]
fn given_lowered_severity_when_reconciled_then_previous_level_is_restored() {
    let mut record = assessed_record("s-monotonic");
    record.previous_severity = Some(SeverityLevel::Critical);
    record.severity_level = SeverityLevel::Low;

    let fixed = reconcile(&record);
    assert_eq!(fixed.severity_level, SeverityLevel::Critical);
}

#[test]
fn given_cleared_escalation_flag_when_reconciled_then_history_makes_it_sticky() {
    let mut record = assessed_record("s-sticky");
    record.escalation_required = false;
    record.escalation.required = false;

    let fixed = reconcile(&record);
    assert!(fixed.escalation_required);
    assert!(fixed.escalation.required);
}

#[test]
fn reconcile_is_idempotent_on_a_broken_record() {
    let mut record = assessed_record("s-idempotent");
    record.escalation_required = false;
    record.previous_severity = Some(SeverityLevel::Critical);
    record.completed_steps.extend([2, 9]);

    let once = reconcile(&record);
    let twice = reconcile(&once);
    assert_eq!(once, twice);
    assert_eq!(once.completed_steps.iter().copied().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn completions_inherited_from_an_earlier_run_are_not_pruned() {
    let mut record = assessed_record("s-inherited");
    record.completed_steps.extend([2, 3]);
    record.begin_run();
    record.current_plan = plan(&[1]);

    let mut fixed = record.clone();
    let corrections = lifeline::session::reconcile_in_place(&mut fixed);
    assert!(
        !corrections
            .iter()
            .any(|correction| matches!(correction, InvariantCorrection::CompletedStepsPruned { .. }))
    );
    assert_eq!(fixed.completed_steps, record.completed_steps);
}

#[tokio::test]
async fn complete_step_accepts_plan_ids_only() {
    let store = SessionStore::new();
    {
        let mut lease = store.open(Some("s-steps".to_string())).await;
        *lease = assessed_record("s-steps");
    }

    let completed = store
        .complete_step("s-steps", 2)
        .await
        .expect("step 2 is in the plan");
    assert_eq!(completed.into_iter().collect::<Vec<_>>(), vec![2]);

    let err = store
        .complete_step("s-steps", 7)
        .await
        .expect_err("step 7 is not in the plan");
    assert_eq!(err.kind, SessionErrorKind::UnknownStep);

    let err = store
        .complete_step("nope", 1)
        .await
        .expect_err("unknown session");
    assert_eq!(err.kind, SessionErrorKind::UnknownSession);
}

#[tokio::test]
async fn open_mints_an_id_when_none_is_given() {
    let store = SessionStore::new();
    let first = store.open(None).await.session_id.clone();
    let second = store.open(None).await.session_id.clone();
    assert_ne!(first, second);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn leases_serialize_one_session_but_not_others() {
    let store = Arc::new(SessionStore::new());
    let held = store.open(Some("busy".to_string())).await;

    let other = tokio::time::timeout(
        Duration::from_millis(200),
        store.open(Some("free".to_string())),
    )
    .await;
    assert!(other.is_ok(), "a different session must not wait");
    drop(other);

    let blocked_store = Arc::clone(&store);
    let blocked = tokio::spawn(async move {
        let lease = blocked_store.lease("busy").await.expect("session exists");
        lease.step_counter
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!blocked.is_finished(), "same session must wait for the lease");

    drop(held);
    let counter = tokio::time::timeout(Duration::from_secs(1), blocked)
        .await
        .expect("lease should be granted after release")
        .expect("task should not panic");
    assert_eq!(counter, 0);
}
