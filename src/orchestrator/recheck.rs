use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    oracle::{OraclePurpose, OracleRequest},
    orchestrator::{
        CrisisReport, EmergencyReason, Flow, LifecycleEvent, Orchestrator, PipelineOutcome,
        escalation,
    },
    router::CrisisDomain,
    session::{SessionRecord, StageError, reconcile_in_place},
    types::{
        ContactKind, EscalationDecision, RecheckAction, RecheckSummary, SeverityLevel,
        WorsenedResponse,
    },
    validator::{
        FallbackContext, PlanContext, RecheckContext, RecheckVerdict,
        fallback::{STABLE_REASSURANCE, URGENT_REASSURANCE, fallback_plan_for},
        schema::{DEFAULT_ASSESSMENT, DEFAULT_RISK_REASON},
        validate,
    },
};

pub const RECHECK_STAGE: &str = "recheck";
const WORSENED_REASON: &str = "Condition has worsened - immediate medical attention required";
const RECHECK_FAILURE_REASON: &str = "Re-evaluation unavailable - recommending emergency contact";
const NOT_ASSESSED_MESSAGE: &str =
    "No assessment exists for this session yet. Please describe the medical situation first.";

/// How one worsened-response answer moves the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecheckTransition {
    pub severity_after: SeverityLevel,
    pub max_steps: usize,
    pub force_escalation: bool,
    pub action: RecheckAction,
    pub fallback: FallbackContext,
}

impl RecheckTransition {
    pub fn for_response(response: WorsenedResponse, before: SeverityLevel) -> Self {
        match response {
            WorsenedResponse::Yes => Self {
                severity_after: before.escalated(),
                max_steps: 5,
                force_escalation: true,
                action: RecheckAction::Escalated,
                fallback: FallbackContext::Worsened,
            },
            WorsenedResponse::Unsure => Self {
                severity_after: before,
                max_steps: 5,
                force_escalation: false,
                action: RecheckAction::Reassessed,
                fallback: FallbackContext::Unsure,
            },
            WorsenedResponse::No => Self {
                severity_after: before,
                max_steps: 3,
                force_escalation: false,
                action: RecheckAction::Continued,
                fallback: FallbackContext::StableOrInitial,
            },
        }
    }

    /// Contacts to use when escalation is forced and the oracle gave none.
    fn forced_contacts(&self) -> Vec<ContactKind> {
        if self.severity_after == SeverityLevel::Critical {
            vec![ContactKind::Ambulance]
        } else {
            vec![ContactKind::NearbyHospital]
        }
    }
}

impl Orchestrator {
    /// Re-evaluates an assessed session after the user says whether symptoms got worse.
    /// Appends exactly one escalation history entry per call, oracle failure included.
    pub async fn recheck(&self, session_id: &str, response: WorsenedResponse) -> PipelineOutcome {
        let mut lease = match self.store.lease(session_id).await {
            Ok(lease) => lease,
            Err(err) => {
                tracing::warn!(target: "orchestrator", session_id = %session_id, error = %err, "recheck_rejected");
                let record = SessionRecord::new(session_id);
                return PipelineOutcome::Error(CrisisReport::degraded(&record, err.message));
            }
        };
        let record = &mut *lease;
        if !record.is_assessed() {
            return PipelineOutcome::Error(CrisisReport::degraded(record, NOT_ASSESSED_MESSAGE));
        }

        self.begin(record, Flow::Recheck);
        let before = record.severity_level;
        let transition = RecheckTransition::for_response(response, before);
        record.previous_severity = Some(before);
        record.raise_severity(transition.severity_after);
        record.advance_step();
        reconcile_in_place(record);

        let after = record.severity_level;
        let ctx = RecheckContext {
            plan: PlanContext {
                max_steps: transition.max_steps,
                fallback: transition.fallback,
                severity: after,
            },
            prior_assessment: record
                .assessment
                .clone()
                .unwrap_or_else(|| DEFAULT_ASSESSMENT.to_string()),
            escalation_required: transition.force_escalation || record.escalation_required,
            contacts: if transition.force_escalation {
                transition.forced_contacts()
            } else {
                record.escalation.contacts.clone()
            },
            escalation_reason: if transition.force_escalation {
                WORSENED_REASON.to_string()
            } else if record.escalation.reason.is_empty() {
                DEFAULT_RISK_REASON.to_string()
            } else {
                record.escalation.reason.clone()
            },
            reassurance_message: match response {
                WorsenedResponse::No => STABLE_REASSURANCE,
                WorsenedResponse::Yes | WorsenedResponse::Unsure => URGENT_REASSURANCE,
            }
            .to_string(),
        };

        let request = OracleRequest::new(OraclePurpose::Recheck)
            .with_field("user_text", record.user_prompt.clone())
            .with_field("crisis_type", record.crisis_type.clone().unwrap_or_default())
            .with_field("assessment", ctx.prior_assessment.clone())
            .with_field("previous_severity", before.as_str())
            .with_field("severity_level", after.as_str())
            .with_field("user_worsened_response", response.as_str())
            .with_field("force_escalation", transition.force_escalation)
            .with_field("completed_steps", record.completed_steps.len())
            .with_field("max_steps", ctx.plan.cap());

        match self.call_oracle(RECHECK_STAGE, request).await {
            Ok(raw) => {
                let verdict = validate::<RecheckVerdict>(&raw, &ctx).into_value();
                let mut decision = EscalationDecision::new(
                    transition.force_escalation || verdict.escalation_required,
                    verdict.contacts,
                    verdict.escalation_reason,
                );
                if decision.required && decision.contacts.is_empty() {
                    decision.contacts = transition.forced_contacts();
                }
                decision.enforce_for_severity(after);

                record.assessment = Some(verdict.assessment);
                record.current_plan = verdict.steps;
                record.reassurance_message = Some(verdict.reassurance_message);
                record.record_escalation(decision);
            }
            Err(error) => {
                self.emit(LifecycleEvent::StageFailed {
                    session_id: record.session_id.clone(),
                    stage: error.stage,
                    message: error.message.clone(),
                });
                record.current_plan = fallback_plan_for(transition.fallback, after);
                record.reassurance_message = Some(ctx.reassurance_message.clone());
                let mut decision = EscalationDecision::new(
                    true,
                    ctx.contacts.clone(),
                    RECHECK_FAILURE_REASON,
                );
                decision.prioritize(ContactKind::Ambulance);
                record.record_escalation(decision);
                record.last_error = Some(error);
            }
        }

        record.symptom_recheck = Some(RecheckSummary {
            asked_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            response,
            severity_before: before,
            severity_after: after,
            action_taken: transition.action,
        });
        let step_counter = record.advance_step();
        reconcile_in_place(record);

        let outcome = match record.last_error.clone() {
            Some(StageError { stage, message, .. }) => {
                PipelineOutcome::Emergency(escalation::build(&EmergencyReason::OracleFailure {
                    domain: CrisisDomain::Medical,
                    stage,
                    detail: message,
                }))
            }
            None => {
                self.emit(LifecycleEvent::StageCompleted {
                    session_id: record.session_id.clone(),
                    stage: RECHECK_STAGE,
                    step_counter,
                });
                PipelineOutcome::Assessed(CrisisReport::from_record(record))
            }
        };
        self.finish(record, Flow::Recheck, outcome)
    }
}
