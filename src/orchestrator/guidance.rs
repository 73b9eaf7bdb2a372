use crate::{
    oracle::{OraclePurpose, OracleRequest},
    orchestrator::{
        CrisisRequest, EmergencyReason, Flow, GuidanceSummary, LifecycleEvent, Orchestrator,
        PipelineOutcome, Routing,
        escalation::{check_emergency, reevaluate},
    },
    router::RiskTier,
    session::reconcile_in_place,
    types::GuidanceStep,
    validator::{GuidanceContext, validate},
};

pub const GUIDANCE_STAGE: &str = "guidance";
const NEEDS_SUPPORT_MESSAGE: &str = "External support recommended";

impl Orchestrator {
    /// Walks the user through one step at a time until the problem is resolved, an
    /// emergency is detected, or the step budget for the risk tier runs out.
    pub async fn guide(&self, request: CrisisRequest) -> PipelineOutcome {
        let routing = Routing::resolve(&request);
        let mut lease = self.store.open(request.session_id.clone()).await;
        let record = &mut *lease;

        self.begin(record, Flow::Guidance);
        record.user_prompt = request.user_text;
        record.risk_tier = Some(routing.tier);
        if routing.tier == RiskTier::Extreme {
            return self.short_circuit(record, Flow::Guidance);
        }

        let domain = routing.category.domain();
        let budget = self.limits.steps_for(routing.tier);
        record.guidance.clear();

        for step in 1..=budget {
            let step_counter = record.advance_step();
            let request = OracleRequest::new(OraclePurpose::GuideStep)
                .with_field("user_text", record.user_prompt.clone())
                .with_field("mood", routing.mood.as_str())
                .with_field("category", routing.category.as_str())
                .with_field("risk_tier", routing.tier.as_str())
                .with_field("step", step)
                .with_field("previous_instructions", previous_instructions(&record.guidance))
                .with_prior_turns(self.guidance_examples.clone());

            let raw = match self.call_oracle(GUIDANCE_STAGE, request).await {
                Ok(raw) => raw,
                Err(error) => {
                    self.emit(LifecycleEvent::StageFailed {
                        session_id: record.session_id.clone(),
                        stage: error.stage,
                        message: error.message.clone(),
                    });
                    let reason = EmergencyReason::OracleFailure {
                        domain,
                        stage: error.stage,
                        detail: error.message.clone(),
                    };
                    record.last_error = Some(error);
                    return self.raise_emergency(record, Flow::Guidance, reason);
                }
            };

            let guidance = validate::<GuidanceStep>(&raw, &GuidanceContext { step }).into_value();
            record.guidance.push(guidance.clone());
            reconcile_in_place(record);
            self.emit(LifecycleEvent::StageCompleted {
                session_id: record.session_id.clone(),
                stage: GUIDANCE_STAGE,
                step_counter,
            });

            let reevaluation = reevaluate(&record.guidance);
            if reevaluation.problem_resolved {
                let summary = GuidanceSummary {
                    session_id: record.session_id.clone(),
                    steps_taken: step,
                    steps: record.guidance.clone(),
                    message: guidance.instruction,
                };
                return self.finish(record, Flow::Guidance, PipelineOutcome::Resolved(summary));
            }
            if let Some(reason) = check_emergency(step, &reevaluation, &self.limits, domain) {
                return self.raise_emergency(record, Flow::Guidance, reason);
            }
        }

        let summary = GuidanceSummary {
            session_id: record.session_id.clone(),
            steps_taken: budget,
            steps: record.guidance.clone(),
            message: NEEDS_SUPPORT_MESSAGE.to_string(),
        };
        self.finish(record, Flow::Guidance, PipelineOutcome::NeedsSupport(summary))
    }
}

fn previous_instructions(history: &[GuidanceStep]) -> String {
    if history.is_empty() {
        return "none".to_string();
    }
    history
        .iter()
        .map(|step| format!("{}. {}", step.step, step.instruction))
        .collect::<Vec<_>>()
        .join(" | ")
}
