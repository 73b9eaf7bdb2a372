//! Drives a crisis interaction through the oracle: the staged assessment pipeline,
//! symptom rechecks against an existing session, and the bounded guidance loop.

mod assessment;
pub mod escalation;
mod guidance;
pub mod outcome;
mod recheck;
pub mod state;
pub mod telemetry;
pub mod types;

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    oracle::{Oracle, OracleRequest, PriorTurn, RawResult},
    router::{self, CrisisCategory, Mood, RiskTier},
    session::{SessionError, SessionRecord, SessionStore, StageError, reconcile_in_place},
    types::{SeverityLevel, StepId},
};

pub use escalation::{EmergencyPayload, EmergencyReason, SafetyAction, SafetyActionKind};
pub use outcome::{CrisisReport, GuidanceSummary, PipelineOutcome};
pub use state::PipelineState;
pub use telemetry::{Flow, LifecycleEvent, LifecycleSink, NoopLifecycleSink, TracingLifecycleSink};
pub use types::{CrisisRequest, LimitsError, OrchestratorLimits};

pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    store: Arc<SessionStore>,
    limits: OrchestratorLimits,
    lifecycle: Arc<dyn LifecycleSink>,
    guidance_examples: Vec<PriorTurn>,
}

impl Orchestrator {
    pub fn new(oracle: Arc<dyn Oracle>, store: Arc<SessionStore>, limits: OrchestratorLimits) -> Self {
        Self {
            oracle,
            store,
            limits,
            lifecycle: Arc::new(NoopLifecycleSink),
            guidance_examples: Vec::new(),
        }
    }

    pub fn with_lifecycle_sink(mut self, sink: Arc<dyn LifecycleSink>) -> Self {
        self.lifecycle = sink;
        self
    }

    /// Example turns replayed ahead of every guidance step request.
    pub fn with_guidance_examples(mut self, examples: Vec<PriorTurn>) -> Self {
        self.guidance_examples = examples;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn limits(&self) -> &OrchestratorLimits {
        &self.limits
    }

    /// Confirms that the user finished a step of the current plan.
    pub async fn complete_step(
        &self,
        session_id: &str,
        step_id: StepId,
    ) -> Result<BTreeSet<StepId>, SessionError> {
        self.store.complete_step(session_id, step_id).await
    }

    fn emit(&self, event: LifecycleEvent) {
        self.lifecycle.on_event(event);
    }

    fn begin(&self, record: &mut SessionRecord, flow: Flow) {
        record.begin_run();
        self.emit(LifecycleEvent::RunStarted {
            session_id: record.session_id.clone(),
            flow,
        });
    }

    async fn call_oracle(
        &self,
        stage: &'static str,
        request: OracleRequest,
    ) -> Result<RawResult, StageError> {
        self.oracle
            .invoke(request)
            .await
            .map_err(|err| StageError::oracle(stage, &err))
    }

    fn finish(&self, record: &mut SessionRecord, flow: Flow, outcome: PipelineOutcome) -> PipelineOutcome {
        reconcile_in_place(record);
        self.emit(LifecycleEvent::RunCompleted {
            session_id: record.session_id.clone(),
            flow,
            status: outcome.status(),
        });
        outcome
    }

    /// Records a required escalation for `reason` and answers with its safety payload.
    fn raise_emergency(
        &self,
        record: &mut SessionRecord,
        flow: Flow,
        reason: EmergencyReason,
    ) -> PipelineOutcome {
        record.record_escalation(reason.escalation());
        let payload = escalation::build(&reason);
        self.finish(record, flow, PipelineOutcome::Emergency(payload))
    }

    fn short_circuit(&self, record: &mut SessionRecord, flow: Flow) -> PipelineOutcome {
        self.emit(LifecycleEvent::ShortCircuited {
            session_id: record.session_id.clone(),
            tier: RiskTier::Extreme,
        });
        record.raise_severity(SeverityLevel::Critical);
        self.raise_emergency(record, flow, EmergencyReason::SelfHarmRisk)
    }
}

/// Router inputs for one request, with detection filling what the caller left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Routing {
    mood: Mood,
    category: CrisisCategory,
    tier: RiskTier,
}

impl Routing {
    fn resolve(request: &CrisisRequest) -> Self {
        let mood = request
            .mood
            .unwrap_or_else(|| router::detect_mood(&request.user_text));
        let category = request
            .category
            .unwrap_or_else(|| router::detect_category(&request.user_text));
        Self {
            mood,
            category,
            tier: router::route(&request.user_text, Some(mood), category),
        }
    }
}
