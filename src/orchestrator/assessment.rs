use crate::{
    oracle::{OraclePurpose, OracleRequest, prompts::NON_MEDICAL_SENTINEL},
    orchestrator::{
        CrisisReport, CrisisRequest, EmergencyReason, Flow, LifecycleEvent, Orchestrator,
        PipelineOutcome, PipelineState, Routing, escalation,
    },
    router::{CrisisDomain, RiskTier},
    session::{SessionRecord, StageError, reconcile_in_place},
    types::{ContactKind, EscalationDecision, SeverityLevel},
    validator::{
        ActionPlan, Classification, PlanContext, RiskAssessment,
        fallback::{ORACLE_FAILURE_DO_NOT_DO, ORACLE_FAILURE_REASSURANCE, oracle_failure_plan},
        schema::DEFAULT_CRISIS_TYPE,
        validate,
    },
};

pub const NON_MEDICAL_MESSAGE: &str =
    "Input is not medical-related. Please describe a medical crisis or health emergency.";
const UNASSESSED_MESSAGE: &str = "Unable to assess the situation properly.";
const RISK_FAILURE_REASON: &str =
    "Unable to properly assess risk - recommending emergency contact";

impl Orchestrator {
    /// Runs the full assessment pipeline for one request.
    pub async fn assess(&self, request: CrisisRequest) -> PipelineOutcome {
        let routing = Routing::resolve(&request);
        let mut lease = self.store.open(request.session_id.clone()).await;
        let record = &mut *lease;

        self.begin(record, Flow::Assessment);
        let history_before = record.escalation_history.len();
        if record.has_history() {
            record.previous_severity = Some(record.severity_level);
        }
        record.user_prompt = request.user_text;
        record.risk_tier = Some(routing.tier);
        if routing.tier == RiskTier::Extreme {
            return self.short_circuit(record, Flow::Assessment);
        }

        let mut state = PipelineState::Normalizing;
        let outcome = loop {
            if state == PipelineState::FormattingOutput {
                let outcome = self.format_output(record, history_before);
                self.commit_stage(record, state, Ok(()));
                break outcome;
            }
            let result = match state {
                PipelineState::Normalizing => self.normalize(record).await,
                PipelineState::Classifying => self.classify(record).await,
                PipelineState::AssessingRisk => self.assess_risk(record).await,
                PipelineState::PlanningActions => self.plan_actions(record).await,
                PipelineState::Failed | PipelineState::FormattingOutput | PipelineState::Done => {
                    Ok(())
                }
            };
            self.commit_stage(record, state, result);
            state = state.next(record.last_error.is_some());
        };
        self.finish(record, Flow::Assessment, outcome)
    }

    fn commit_stage(
        &self,
        record: &mut SessionRecord,
        state: PipelineState,
        result: Result<(), StageError>,
    ) {
        let step_counter = record.advance_step();
        match result {
            Ok(()) if state == PipelineState::Failed => {}
            Ok(()) => self.emit(LifecycleEvent::StageCompleted {
                session_id: record.session_id.clone(),
                stage: state.as_str(),
                step_counter,
            }),
            Err(error) => {
                self.emit(LifecycleEvent::StageFailed {
                    session_id: record.session_id.clone(),
                    stage: error.stage,
                    message: error.message.clone(),
                });
                record.last_error = Some(error);
            }
        }
        reconcile_in_place(record);
    }

    async fn normalize(&self, record: &mut SessionRecord) -> Result<(), StageError> {
        let stage = PipelineState::Normalizing.as_str();
        let request = OracleRequest::new(OraclePurpose::Normalize)
            .with_field("user_text", record.user_prompt.clone());
        let raw = self.call_oracle(stage, request).await?;

        let normalized = raw.content.trim();
        if normalized.contains(NON_MEDICAL_SENTINEL) {
            return Err(StageError::rejected_input(stage, NON_MEDICAL_MESSAGE));
        }
        record.normalized_input = Some(if normalized.is_empty() {
            record.user_prompt.clone()
        } else {
            normalized.to_string()
        });
        Ok(())
    }

    async fn classify(&self, record: &mut SessionRecord) -> Result<(), StageError> {
        let stage = PipelineState::Classifying.as_str();
        let request = OracleRequest::new(OraclePurpose::Classify)
            .with_field("normalized_input", normalized_input(record));

        match self.call_oracle(stage, request).await {
            Ok(raw) => {
                let classification = validate::<Classification>(&raw, &()).into_value();
                record.crisis_type = Some(classification.crisis_type);
                record.severity_level = classification.severity_level;
                record.assessment = Some(classification.assessment);
                Ok(())
            }
            Err(error) => {
                record.crisis_type = Some(DEFAULT_CRISIS_TYPE.to_string());
                record.raise_severity(SeverityLevel::Moderate);
                record.assessment = Some(UNASSESSED_MESSAGE.to_string());
                Err(error)
            }
        }
    }

    async fn assess_risk(&self, record: &mut SessionRecord) -> Result<(), StageError> {
        let stage = PipelineState::AssessingRisk.as_str();
        let request = OracleRequest::new(OraclePurpose::AssessRisk)
            .with_field("normalized_input", normalized_input(record))
            .with_field("crisis_type", record.crisis_type.clone().unwrap_or_default())
            .with_field("severity_level", record.severity_level.as_str());

        match self.call_oracle(stage, request).await {
            Ok(raw) => {
                let mut decision = validate::<RiskAssessment>(&raw, &()).into_value().escalation;
                decision.enforce_for_severity(record.severity_level);
                record.record_escalation(decision);
                Ok(())
            }
            Err(error) => {
                record.record_escalation(EscalationDecision::new(
                    true,
                    vec![ContactKind::Ambulance],
                    RISK_FAILURE_REASON,
                ));
                Err(error)
            }
        }
    }

    async fn plan_actions(&self, record: &mut SessionRecord) -> Result<(), StageError> {
        let stage = PipelineState::PlanningActions.as_str();
        let ctx = PlanContext::initial(record.severity_level);
        let request = OracleRequest::new(OraclePurpose::PlanActions)
            .with_field("normalized_input", normalized_input(record))
            .with_field("crisis_type", record.crisis_type.clone().unwrap_or_default())
            .with_field("severity_level", record.severity_level.as_str())
            .with_field("escalation_required", record.escalation_required)
            .with_field("max_steps", ctx.cap());

        match self.call_oracle(stage, request).await {
            Ok(raw) => {
                let plan = validate::<ActionPlan>(&raw, &ctx).into_value();
                record.current_plan = plan.steps;
                record.do_not_do = plan.do_not_do;
                record.reassurance_message = Some(plan.reassurance_message);
                Ok(())
            }
            Err(error) => {
                record.current_plan = oracle_failure_plan();
                record.do_not_do = ORACLE_FAILURE_DO_NOT_DO
                    .iter()
                    .map(|item| item.to_string())
                    .collect();
                record.reassurance_message = Some(ORACLE_FAILURE_REASSURANCE.to_string());
                Err(error)
            }
        }
    }

    fn format_output(&self, record: &mut SessionRecord, history_before: usize) -> PipelineOutcome {
        let Some(error) = record.last_error.clone() else {
            return PipelineOutcome::Assessed(CrisisReport::from_record(record));
        };

        if !error.is_oracle_failure() {
            return PipelineOutcome::Error(CrisisReport::degraded(record, error.message));
        }

        let reason = EmergencyReason::OracleFailure {
            domain: CrisisDomain::Medical,
            stage: error.stage,
            detail: error.message,
        };
        // A failed risk stage has already recorded a required escalation for this run.
        let recorded_this_run = record.escalation_history[history_before..]
            .iter()
            .any(|entry| entry.required);
        if !recorded_this_run {
            record.record_escalation(reason.escalation());
        }
        PipelineOutcome::Emergency(escalation::build(&reason))
    }
}

fn normalized_input(record: &SessionRecord) -> String {
    record
        .normalized_input
        .clone()
        .unwrap_or_else(|| record.user_prompt.clone())
}
