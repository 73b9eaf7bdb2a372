use crate::{router::RiskTier, types::SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Assessment,
    Recheck,
    Guidance,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assessment => "assessment",
            Self::Recheck => "recheck",
            Self::Guidance => "guidance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    RunStarted {
        session_id: SessionId,
        flow: Flow,
    },
    StageCompleted {
        session_id: SessionId,
        stage: &'static str,
        step_counter: u32,
    },
    StageFailed {
        session_id: SessionId,
        stage: &'static str,
        message: String,
    },
    ShortCircuited {
        session_id: SessionId,
        tier: RiskTier,
    },
    RunCompleted {
        session_id: SessionId,
        flow: Flow,
        status: &'static str,
    },
}

pub trait LifecycleSink: Send + Sync {
    fn on_event(&self, event: LifecycleEvent);
}

#[derive(Default)]
pub struct NoopLifecycleSink;

impl LifecycleSink for NoopLifecycleSink {
    fn on_event(&self, _event: LifecycleEvent) {}
}

#[derive(Default)]
pub struct TracingLifecycleSink;

impl LifecycleSink for TracingLifecycleSink {
    fn on_event(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::RunStarted { session_id, flow } => {
                tracing::info!(target: "orchestrator", session_id = %session_id, flow = flow.as_str(), "run_started");
            }
            LifecycleEvent::StageCompleted {
                session_id,
                stage,
                step_counter,
            } => {
                tracing::debug!(
                    target: "orchestrator",
                    session_id = %session_id,
                    stage = stage,
                    step_counter = step_counter,
                    "stage_completed"
                );
            }
            LifecycleEvent::StageFailed {
                session_id,
                stage,
                message,
            } => {
                tracing::warn!(
                    target: "orchestrator",
                    session_id = %session_id,
                    stage = stage,
                    error = %message,
                    "stage_failed"
                );
            }
            LifecycleEvent::ShortCircuited { session_id, tier } => {
                tracing::warn!(target: "orchestrator", session_id = %session_id, tier = tier.as_str(), "short_circuited");
            }
            LifecycleEvent::RunCompleted {
                session_id,
                flow,
                status,
            } => {
                tracing::info!(
                    target: "orchestrator",
                    session_id = %session_id,
                    flow = flow.as_str(),
                    status = status,
                    "run_completed"
                );
            }
        }
    }
}
